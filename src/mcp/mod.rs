pub mod server;
pub mod stats_analyzer;
pub mod tools;

pub use server::{McpServer, run_mcp_server, serve};
