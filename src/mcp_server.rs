use anyhow::{Context, Result, anyhow};
use chatgpt_history::mcp::{McpServer, run_mcp_server};
use chatgpt_history::shared::logging::init_logging;
use chatgpt_history::shared::{Config, SearchEngine};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "chatgpt-history-mcp")]
#[command(about = "MCP server that makes your ChatGPT conversations searchable")]
struct Args {
    /// Export .zip or conversations.json
    #[arg(long, env = "CHATGPT_EXPORT_PATH")]
    export_path: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn print_export_instructions() {
    eprintln!("Error: No export path provided.");
    eprintln!("Use --export-path or set CHATGPT_EXPORT_PATH environment variable.");
    eprintln!();
    eprintln!("To export your data from ChatGPT:");
    eprintln!("  1. Go to https://chatgpt.com");
    eprintln!("  2. Settings → Data Controls → Export Data");
    eprintln!("  3. Wait for the email, download the ZIP");
    eprintln!("  4. Run: chatgpt-history-mcp --export-path /path/to/export.zip");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    // Logs go to stderr so they don't interfere with JSON-RPC
    init_logging(&config.logging.level);

    let Some(export_path) = config.resolve_export_path(args.export_path) else {
        print_export_instructions();
        std::process::exit(1);
    };

    if !export_path.exists() {
        return Err(anyhow!("File not found: {}", export_path.display()));
    }

    info!("ChatGPT History MCP Server starting...");
    info!("Loading ChatGPT export from {}", export_path.display());

    let path = export_path.clone();
    let engine = tokio::task::spawn_blocking(move || SearchEngine::load(&path))
        .await?
        .with_context(|| format!("Failed to load {}", export_path.display()))?;

    run_mcp_server(McpServer::new(engine, export_path, config)).await
}
