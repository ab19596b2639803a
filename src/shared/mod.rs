pub mod config;
pub mod error;
pub mod format;
pub mod indexer;
pub mod loader;
pub mod logging;
pub mod models;
pub mod parser;
pub mod search;
pub mod stats;
pub mod tokenizer;
pub mod utils;

pub use config::*;
pub use error::LoadError;
pub use indexer::{Posting, SearchIndex};
pub use loader::load;
pub use models::*;
pub use search::*;
pub use stats::UsageStats;
pub use tokenizer::tokenize;
