use crate::shared::format::{
    format_conversation, format_conversation_list, format_search_results, format_stats,
};
use crate::shared::logging::{init_logging, level_for_verbosity};
use crate::shared::utils::check_range;
use crate::shared::{Config, SearchEngine, SearchQuery, UsageStats};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "chatgpt-history")]
#[command(about = "Search and browse a ChatGPT data export")]
pub struct Cli {
    /// Export .zip or conversations.json
    #[arg(long, global = true, env = "CHATGPT_EXPORT_PATH")]
    pub export_path: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search conversations by keyword
    Search {
        /// Search query
        query: String,
        /// Results limit
        #[arg(long)]
        limit: Option<usize>,
        /// Only conversations created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Only conversations created on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Print a full conversation
    Show {
        /// Conversation id
        id: String,
        /// Stop after this many messages
        #[arg(long)]
        max_messages: Option<usize>,
    },
    /// List conversations, newest first
    List {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "0")]
        offset: usize,
    },
    /// Show usage statistics
    Stats,
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    init_logging(&level_for_verbosity(cli.verbose, &config.logging.level));

    let export_path = config
        .resolve_export_path(cli.export_path.clone())
        .ok_or_else(|| {
            anyhow!("No export path provided. Use --export-path or set CHATGPT_EXPORT_PATH.")
        })?;

    info!("Loading ChatGPT export from {}", export_path.display());
    let engine = tokio::task::spawn_blocking(move || SearchEngine::load(&export_path))
        .await?
        .context("Failed to load export")?;

    let output = run_command(&engine, &config, cli.command)?;
    println!("{output}");
    Ok(())
}

/// Render one subcommand against a loaded engine.
pub fn run_command(engine: &SearchEngine, config: &Config, command: Commands) -> Result<String> {
    match command {
        Commands::Search {
            query,
            limit,
            from,
            to,
        } => {
            let query = query.trim();
            if query.is_empty() {
                return Err(anyhow!("Search query must not be empty"));
            }

            let limit = limit.unwrap_or(config.search.default_limit);
            let limit =
                check_range("--limit", limit, config.search.max_limit).map_err(|e| anyhow!(e))?;
            debug!("Searching for '{}' (limit {})", query, limit);

            let hits = engine.search(&SearchQuery {
                date_from: from,
                date_to: to,
                ..SearchQuery::new(query, limit)
            });
            let rendered = format_search_results(query, &hits, config.search.preview_chars);
            Ok(rendered)
        }
        Commands::Show { id, max_messages } => {
            let max_messages = max_messages
                .map(|m| check_range("--max-messages", m, config.conversation.max_messages))
                .transpose()
                .map_err(|e| anyhow!(e))?;
            let conv = engine
                .find_by_id(&id)
                .ok_or_else(|| anyhow!("Conversation not found: {id}"))?;
            Ok(format_conversation(conv, max_messages))
        }
        Commands::List { limit, offset } => {
            let limit = limit.unwrap_or(config.list.default_limit);
            let limit =
                check_range("--limit", limit, config.list.max_limit).map_err(|e| anyhow!(e))?;
            let (page, total) = engine.list_page(offset, limit);
            Ok(format_conversation_list(page, offset, total))
        }
        Commands::Stats => Ok(format_stats(&UsageStats::compute(engine.conversations()))),
    }
}
