#![forbid(unsafe_code)]

//! Route seam.
//!
//! The core consumes routing only to know which logical page is active
//! when resolving navigation events and when driving replay or static
//! generation. [`RouteTable`] is a deterministic in-memory implementation
//! sufficient for both.

use crate::error::RouteError;

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// The path pattern. A trailing `*` matches any suffix.
    pub pattern: String,
    /// A stable route name.
    pub name: String,
}

impl Route {
    /// Create a route.
    #[must_use]
    pub fn new(pattern: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            name: name.into(),
        }
    }

    /// Whether this route matches a concrete path.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self.pattern.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => self.pattern == path,
        }
    }
}

/// Routing capability consumed by the synchronization core.
pub trait Router {
    /// Resolve a concrete path to its route.
    fn match_path(&self, path: &str) -> Result<Route, RouteError>;

    /// Navigate to a path, making its route current.
    fn goto(&mut self, path: &str) -> Result<(), RouteError>;

    /// The currently active path.
    fn current(&self) -> &str;

    /// All registered routes, in registration order.
    fn routes(&self) -> &[Route];
}

/// Deterministic in-memory route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    current: String,
}

impl RouteTable {
    /// Create an empty table with `/` as the current path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            current: "/".to_owned(),
        }
    }

    /// Register a route.
    #[must_use]
    pub fn with_route(mut self, pattern: impl Into<String>, name: impl Into<String>) -> Self {
        self.routes.push(Route::new(pattern, name));
        self
    }
}

impl Router for RouteTable {
    fn match_path(&self, path: &str) -> Result<Route, RouteError> {
        self.routes
            .iter()
            .find(|route| route.matches(path))
            .cloned()
            .ok_or_else(|| RouteError::NoMatch(path.to_owned()))
    }

    fn goto(&mut self, path: &str) -> Result<(), RouteError> {
        self.match_path(path)?;
        self.current = path.to_owned();
        Ok(())
    }

    fn current(&self) -> &str {
        &self.current
    }

    fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new()
            .with_route("/", "home")
            .with_route("/docs/*", "docs")
            .with_route("/about", "about")
    }

    #[test]
    fn exact_match() {
        let t = table();
        assert_eq!(t.match_path("/about").unwrap().name, "about");
    }

    #[test]
    fn wildcard_match() {
        let t = table();
        assert_eq!(t.match_path("/docs/intro").unwrap().name, "docs");
    }

    #[test]
    fn first_registration_wins() {
        let t = RouteTable::new()
            .with_route("/x/*", "broad")
            .with_route("/x/y", "narrow");
        assert_eq!(t.match_path("/x/y").unwrap().name, "broad");
    }

    #[test]
    fn no_match_is_an_error() {
        let t = table();
        assert!(matches!(
            t.match_path("/missing"),
            Err(RouteError::NoMatch(_))
        ));
    }

    #[test]
    fn goto_updates_current() {
        let mut t = table();
        assert_eq!(t.current(), "/");
        t.goto("/about").unwrap();
        assert_eq!(t.current(), "/about");
        assert!(t.goto("/nope").is_err());
        assert_eq!(t.current(), "/about");
    }
}
