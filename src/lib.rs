pub mod mcp;
pub mod shared;

#[cfg(feature = "cli")]
pub mod cli;

pub use shared::{Conversation, LoadError, SearchEngine, SearchHit, SearchQuery};
