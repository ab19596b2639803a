use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use super::tools::CallToolResponse;
use crate::shared::format::format_stats;
use crate::shared::{SearchEngine, UsageStats};

pub fn handle_get_stats(engine: &SearchEngine) -> Result<Value> {
    let stats = UsageStats::compute(engine.conversations());
    debug!(
        "Stats over {} conversations, {} messages",
        stats.total_conversations, stats.total_messages
    );

    CallToolResponse::text(format_stats(&stats)).into_value()
}
