use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::shared::format::{format_conversation, format_conversation_list, format_search_results};
use crate::shared::utils::check_range;
use crate::shared::{Config, SearchEngine, SearchQuery};

#[derive(Debug, Serialize, Deserialize)]
pub struct CallToolResponse {
    pub content: Vec<ToolResult>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(rename = "type")]
    pub result_type: String,
    pub text: String,
}

impl CallToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResult {
                result_type: "text".to_string(),
                text: text.into(),
            }],
            is_error: None,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: Some(true),
            ..Self::text(text)
        }
    }

    pub fn into_value(self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetConversationArgs {
    pub conversation_id: String,
    #[serde(default)]
    pub max_messages: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListArgs {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

fn parse_args<T: DeserializeOwned>(args: Option<Value>) -> Result<T, String> {
    let args = match args {
        Some(Value::Null) | None => json!({}),
        Some(v) => v,
    };
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {e}"))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn tool_definitions(config: &Config) -> Value {
    let read_only = |title: &str| {
        json!({
            "title": title,
            "readOnlyHint": true,
            "destructiveHint": false,
            "idempotentHint": true,
            "openWorldHint": false
        })
    };

    json!([
        {
            "name": "chatgpt_search",
            "description": "Search through your ChatGPT conversation history by topic, keyword, or phrase. Returns a ranked list of matching conversations with titles, dates, and previews. Use conversation IDs from the results to retrieve full conversation content.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query: keywords, topics, or phrases. Example: 'python debugging', 'recipe for pasta'",
                        "minLength": 1,
                        "maxLength": config.search.max_query_chars
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results to return",
                        "default": config.search.default_limit,
                        "minimum": 1,
                        "maximum": config.search.max_limit
                    },
                    "date_from": {
                        "type": "string",
                        "description": "Only conversations from this date onwards (YYYY-MM-DD)"
                    },
                    "date_to": {
                        "type": "string",
                        "description": "Only conversations up to this date (YYYY-MM-DD)"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            },
            "annotations": read_only("Search ChatGPT History")
        },
        {
            "name": "chatgpt_get_conversation",
            "description": "Retrieve the full content of a specific ChatGPT conversation. Use the conversation ID from search results.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "conversation_id": {
                        "type": "string",
                        "description": "The ID of the conversation to retrieve (from search results)",
                        "minLength": 1
                    },
                    "max_messages": {
                        "type": "integer",
                        "description": "Limit the number of messages returned. Omit for all messages.",
                        "minimum": 1,
                        "maximum": config.conversation.max_messages
                    }
                },
                "required": ["conversation_id"],
                "additionalProperties": false
            },
            "annotations": read_only("Get Full ChatGPT Conversation")
        },
        {
            "name": "chatgpt_list_conversations",
            "description": "List your ChatGPT conversations, sorted by date (newest first).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Number of conversations to list",
                        "default": config.list.default_limit,
                        "minimum": 1,
                        "maximum": config.list.max_limit
                    },
                    "offset": {
                        "type": "integer",
                        "description": "Offset for pagination",
                        "default": 0,
                        "minimum": 0
                    }
                },
                "additionalProperties": false
            },
            "annotations": read_only("List ChatGPT Conversations")
        },
        {
            "name": "chatgpt_stats",
            "description": "Overview of your ChatGPT usage: total conversations, messages, date range, models and monthly activity.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false },
            "annotations": read_only("ChatGPT Usage Statistics")
        },
        {
            "name": "chatgpt_reload",
            "description": "Re-read the ChatGPT export from disk and rebuild the search index.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false },
            "annotations": {
                "title": "Reload ChatGPT Export",
                "readOnlyHint": false,
                "destructiveHint": false,
                "idempotentHint": true,
                "openWorldHint": false
            }
        }
    ])
}

pub fn search_conversations(
    engine: &SearchEngine,
    config: &Config,
    args: Option<Value>,
) -> Result<Value> {
    let args: SearchArgs = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return CallToolResponse::error(e).into_value(),
    };

    let query_text = args.query.trim().to_string();
    let query_len = query_text.chars().count();
    if query_len == 0 || query_len > config.search.max_query_chars {
        return CallToolResponse::error(format!(
            "'query' must be between 1 and {} characters",
            config.search.max_query_chars
        ))
        .into_value();
    }

    let limit = match check_range(
        "limit",
        args.limit.unwrap_or(config.search.default_limit),
        config.search.max_limit,
    ) {
        Ok(l) => l,
        Err(e) => return CallToolResponse::error(e).into_value(),
    };

    let query = SearchQuery {
        text: query_text,
        limit,
        date_from: non_empty(args.date_from),
        date_to: non_empty(args.date_to),
    };
    debug!("Searching: {:?}", query);

    let hits = engine.search(&query);
    let text = format_search_results(&query.text, &hits, config.search.preview_chars);
    CallToolResponse::text(text).into_value()
}

pub fn get_conversation(
    engine: &SearchEngine,
    config: &Config,
    args: Option<Value>,
) -> Result<Value> {
    let args: GetConversationArgs = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return CallToolResponse::error(e).into_value(),
    };

    let id = args.conversation_id.trim();
    if id.is_empty() {
        return CallToolResponse::error("'conversation_id' must not be empty").into_value();
    }

    let max_messages = match args
        .max_messages
        .map(|m| check_range("max_messages", m, config.conversation.max_messages))
        .transpose()
    {
        Ok(m) => m,
        Err(e) => return CallToolResponse::error(e).into_value(),
    };

    match engine.find_by_id(id) {
        Some(conv) => {
            let text = format_conversation(conv, max_messages);
            CallToolResponse::text(text).into_value()
        }
        None => {
            let message = format!("Error: Conversation with ID '{id}' not found.");
            CallToolResponse::error(message).into_value()
        }
    }
}

pub fn list_conversations(
    engine: &SearchEngine,
    config: &Config,
    args: Option<Value>,
) -> Result<Value> {
    let args: ListArgs = match parse_args(args) {
        Ok(a) => a,
        Err(e) => return CallToolResponse::error(e).into_value(),
    };

    let limit = match check_range(
        "limit",
        args.limit.unwrap_or(config.list.default_limit),
        config.list.max_limit,
    ) {
        Ok(l) => l,
        Err(e) => return CallToolResponse::error(e).into_value(),
    };
    let offset = args.offset.unwrap_or(0);

    let (page, total) = engine.list_page(offset, limit);
    CallToolResponse::text(format_conversation_list(page, offset, total)).into_value()
}
