//! Markdown rendering shared by the CLI and the MCP tools.

use super::models::{Conversation, SearchHit, epoch_to_datetime};
use super::stats::UsageStats;

const BAR_WIDTH: usize = 50;

pub fn format_search_results(query: &str, hits: &[SearchHit<'_>], preview_chars: usize) -> String {
    if hits.is_empty() {
        return format!("No conversations found matching '{query}'.");
    }

    let mut output = format!(
        "## Found {} conversation(s) matching '{}'\n\n",
        hits.len(),
        query
    );

    for (i, hit) in hits.iter().enumerate() {
        let conv = hit.conversation;
        output.push_str(&format!("### {}. {}\n", i + 1, conv.title));
        output.push_str(&format!("- **ID**: `{}`\n", conv.id));
        output.push_str(&format!("- **Date**: {}\n", conv.date_str()));
        output.push_str(&format!("- **Messages**: {}\n", conv.message_count()));
        if !conv.model_slug.is_empty() {
            output.push_str(&format!("- **Model**: {}\n", conv.model_slug));
        }
        output.push_str(&format!("- **Score**: {:.4}\n", hit.score));
        output.push_str(&format!(
            "- **Preview**: {}\n\n",
            conv.preview(preview_chars)
        ));
    }

    output
}

/// Full transcript, optionally cut to the first `max_messages` messages.
pub fn format_conversation(conv: &Conversation, max_messages: Option<usize>) -> String {
    let shown = max_messages
        .unwrap_or(conv.messages.len())
        .min(conv.messages.len());

    let mut output = format!(
        "## {}\n**Date**: {} | **Messages**: {}\n\n---\n\n",
        conv.title,
        conv.date_str(),
        conv.message_count()
    );

    for msg in &conv.messages[..shown] {
        let date = msg.date_str();
        if date.is_empty() {
            output.push_str(&format!("**{}**:\n", msg.role.display_label()));
        } else {
            output.push_str(&format!("**{}** ({}):\n", msg.role.display_label(), date));
        }
        output.push_str(&msg.text);
        output.push_str("\n\n");
    }

    let hidden = conv.messages.len() - shown;
    if hidden > 0 {
        output.push_str(&format!(
            "*… {hidden} more messages not shown. Increase max_messages to see more.*\n"
        ));
    }

    output
}

pub fn format_conversation_list(page: &[Conversation], offset: usize, total: usize) -> String {
    if total == 0 {
        return "No conversations loaded.".to_string();
    }

    let start = offset.min(total);
    let end = start + page.len();
    let mut output = format!(
        "## ChatGPT Conversations ({}–{} of {})\n\n",
        start + 1,
        end,
        total
    );

    for conv in page {
        output.push_str(&format!(
            "- **{}** ({}) — {} messages — ID: `{}`\n",
            conv.title,
            conv.date_str(),
            conv.message_count(),
            conv.id
        ));
    }

    if end < total {
        output.push_str(&format!(
            "\n*Showing {} of {}. Use offset={} to see more.*\n",
            page.len(),
            total,
            end
        ));
    }

    output
}

pub fn format_stats(stats: &UsageStats) -> String {
    if stats.total_conversations == 0 {
        return "No conversations loaded.".to_string();
    }

    let day = |ts: Option<f64>| {
        ts.and_then(epoch_to_datetime)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };

    let mut output = String::from("## ChatGPT Usage Statistics\n\n");
    output.push_str(&format!(
        "- **Total conversations**: {}\n",
        thousands(stats.total_conversations)
    ));
    output.push_str(&format!(
        "- **Total messages**: {}\n",
        thousands(stats.total_messages)
    ));
    output.push_str(&format!(
        "- **Date range**: {} → {}\n\n",
        day(stats.earliest),
        day(stats.latest)
    ));

    output.push_str("### Model Usage\n");
    for (model, count) in &stats.models {
        output.push_str(&format!(
            "- {}: {} conversations\n",
            model,
            thousands(*count)
        ));
    }

    output.push_str("\n### Monthly Activity (last 12 months)\n");
    for (month, count) in &stats.monthly {
        let bar = "█".repeat((*count).min(BAR_WIDTH));
        output.push_str(&format!("- {month}: {bar} ({count})\n"));
    }

    output
}

fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
