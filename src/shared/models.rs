use super::utils::truncate_chars;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a flattened message. Exports also carry other roles
/// (e.g. "unknown"); those never make it into a transcript.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            "tool" => Some(Role::Tool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }

    /// Label used when rendering a transcript.
    pub fn display_label(&self) -> &'static str {
        match self {
            Role::User => "🧑 You",
            Role::Assistant => "🤖 ChatGPT",
            Role::System => "⚙️ System",
            Role::Tool => "🔧 Tool",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: Option<f64>,
}

impl Message {
    /// `YYYY-MM-DD HH:MM UTC`, or an empty string when the export had no timestamp.
    pub fn date_str(&self) -> String {
        self.timestamp
            .filter(|ts| *ts != 0.0)
            .and_then(epoch_to_datetime)
            .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub create_time: Option<f64>,
    pub update_time: Option<f64>,
    pub model_slug: String,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Sort key for the collection and for date filtering.
    pub fn created_at(&self) -> f64 {
        self.create_time.unwrap_or(0.0)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn date_str(&self) -> String {
        self.create_time
            .filter(|ts| *ts != 0.0)
            .or(self.update_time.filter(|ts| *ts != 0.0))
            .and_then(epoch_to_datetime)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown date".to_string())
    }

    /// User turns joined with ` | `, cut at `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> String {
        let preview = self
            .messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(" | ");

        truncate_chars(&preview, max_chars)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: String,
    pub limit: usize,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Upper bound, `YYYY-MM-DD` at UTC midnight.
    pub date_to: Option<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            limit,
            date_from: None,
            date_to: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub conversation: &'a Conversation,
    pub score: f64,
}

pub fn epoch_to_datetime(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1_000_000_000.0) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos.min(999_999_999))
}
