#![forbid(unsafe_code)]

//! Sync: the element tree, mutation capture/replay, and state history
//! serialization.
//!
//! A tree built in one environment (server) is reconstructed in another
//! (browser) by replaying its captured mutation log against a freshly
//! constructed tree. Correctness rests on two disciplines shared with the
//! event bridge: synchronous run-to-completion dispatch, and one
//! transactional interceptor through which every mutation flows.

pub mod error;
pub mod history;
pub mod hydrate;
pub mod recorder;
pub mod replay;
pub mod tree;

pub use error::{HistoryError, ReplayError, TreeError};
pub use history::{
    STATE_BLOCK_ID, decode_blob, embed_block, encode_records, extract_block,
    parse_history_payload,
};
pub use hydrate::{StaticPage, generate_routes, hydrate, snapshot};
pub use recorder::{MutationRecord, MutationRecorder};
pub use replay::replay;
pub use tree::Tree;
