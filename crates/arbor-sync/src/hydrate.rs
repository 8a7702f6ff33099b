#![forbid(unsafe_code)]

//! Hydration and static generation drivers.
//!
//! Hydration reuses a server-produced tree snapshot on the client: the
//! embedded blob is decoded, replayed against a tree built via the
//! identical construction path, and capture is re-armed for subsequent
//! interaction. Static generation runs the inverse per enumerated route.

use arbor_core::{Route, Router};

use crate::error::{HistoryError, ReplayError};
use crate::history::{decode_blob, encode_records};
use crate::replay::replay;
use crate::tree::Tree;

/// Hydrate a freshly constructed tree from a transferred blob.
///
/// Returns the number of records reapplied. On success capture is armed.
///
/// # Errors
///
/// Decode failures and replay mismatches abort atomically; the caller
/// must discard the blob and force a full rebuild.
pub fn hydrate(tree: &mut Tree, blob: &str) -> Result<usize, ReplayError> {
    let records = decode_blob(blob)?;
    replay(tree, &records)?;
    tracing::info!(
        target: "arbor.replay",
        mode = tree.mode().as_str(),
        records = records.len(),
        "hydration complete"
    );
    Ok(records.len())
}

/// Snapshot a tree's captured mutation log into its transferable form.
///
/// # Errors
///
/// Fails when the log cannot be encoded (non-finite numbers).
pub fn snapshot(tree: &Tree) -> Result<String, HistoryError> {
    encode_records(tree.records())
}

/// One statically generated page: a route path and its state blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPage {
    /// The route's path pattern.
    pub path: String,
    /// The encoded state blob to embed in this page's markup.
    pub blob: String,
}

/// Drive static generation: build one fresh tree per enumerated route and
/// snapshot each. The builder runs the same construction path hydration
/// will use on the client.
///
/// # Errors
///
/// Propagates builder and encoding failures; generation is best thought
/// of as a batch of independent server renders, so the first failure
/// aborts the batch.
pub fn generate_routes<B>(router: &dyn Router, mut build: B) -> Result<Vec<StaticPage>, ReplayError>
where
    B: FnMut(&Route) -> Result<Tree, ReplayError>,
{
    let mut pages = Vec::with_capacity(router.routes().len());
    for route in router.routes() {
        let tree = build(route)?;
        let blob = snapshot(&tree)?;
        tracing::debug!(
            target: "arbor.replay",
            route = %route.pattern,
            records = tree.records().len(),
            "generated static page state"
        );
        pages.push(StaticPage {
            path: route.pattern.clone(),
            blob,
        });
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::{ElementId, HeadlessAdapter, RouteTable, RunMode, SlotCategory, Value};

    fn server_tree() -> Tree {
        Tree::new(Box::new(HeadlessAdapter::new()), RunMode::ServerRender).unwrap()
    }

    fn client_tree() -> Tree {
        Tree::new(Box::new(HeadlessAdapter::new()), RunMode::Browser).unwrap()
    }

    fn build_page(tree: &mut Tree) -> ElementId {
        let root = tree.create_element("div", ElementId::WINDOW).unwrap();
        tree.create_element("input", root).unwrap();
        root
    }

    #[test]
    fn snapshot_then_hydrate_round_trips() {
        let mut server = server_tree();
        let root = build_page(&mut server);
        server.capture();
        server
            .set_slot(root, SlotCategory::Attribute, "class", Value::from("ready"))
            .unwrap();
        let blob = snapshot(&server).unwrap();

        let mut client = client_tree();
        build_page(&mut client);
        let applied = hydrate(&mut client, &blob).unwrap();

        assert_eq!(applied, 1);
        assert_eq!(server.observable_state(), client.observable_state());
        assert!(client.is_capturing());
    }

    #[test]
    fn hydrate_rejects_corrupt_blob_atomically() {
        let mut client = client_tree();
        build_page(&mut client);
        let before = client.observable_state();

        let err = hydrate(&mut client, "@@@").unwrap_err();
        assert!(matches!(err, ReplayError::History(_)));
        assert_eq!(client.observable_state(), before);
        assert!(!client.is_capturing());
    }

    #[test]
    fn generate_routes_produces_one_page_per_route() {
        let router = RouteTable::new()
            .with_route("/", "home")
            .with_route("/about", "about");

        let pages = generate_routes(&router, |route| {
            let mut tree = Tree::new(Box::new(HeadlessAdapter::new()), RunMode::StaticGen)
                .map_err(ReplayError::Tree)?;
            let root = build_page(&mut tree);
            tree.capture();
            tree.set_slot(
                root,
                SlotCategory::Property,
                "route",
                Value::from(route.name.as_str()),
            )
            .map_err(ReplayError::Tree)?;
            Ok(tree)
        })
        .unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].path, "/");
        assert_eq!(pages[1].path, "/about");
        assert_ne!(pages[0].blob, pages[1].blob);

        // Each blob hydrates a matching client tree.
        let mut client = client_tree();
        build_page(&mut client);
        hydrate(&mut client, &pages[1].blob).unwrap();
        assert_eq!(
            client
                .slot(ElementId::from_raw(1), SlotCategory::Property, "route")
                .and_then(Value::as_str),
            Some("about")
        );
    }
}
