use super::error::LoadError;
use super::models::{Conversation, Message, Role};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

const DEFAULT_TITLE: &str = "Untitled";

/// Message payload attached to a node of the export's `mapping` tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub role: Option<String>,
    pub content: Option<Value>,
    pub create_time: Option<f64>,
}

impl RawMessage {
    fn from_json(json: &Value) -> Option<Self> {
        let obj = json.as_object()?;
        Some(Self {
            role: obj
                .get("author")
                .and_then(|a| a.get("role"))
                .and_then(|r| r.as_str())
                .map(|s| s.to_string()),
            content: obj.get("content").cloned(),
            create_time: obj.get("create_time").and_then(|v| v.as_f64()),
        })
    }

    /// Turn the payload into a transcript message, if it carries any.
    fn to_message(&self) -> Option<Message> {
        let content = self.content.as_ref().filter(|c| is_truthy(c))?;
        let role = self.role.as_deref().unwrap_or("unknown");
        let text = extract_text(content);

        if text.trim().is_empty() {
            return None;
        }
        let Some(role) = Role::parse(role) else {
            trace!("Skipping message with role {:?}", role);
            return None;
        };

        Some(Message {
            role,
            text,
            timestamp: self.create_time,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub id: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub message: Option<RawMessage>,
}

/// Arena holding one conversation's `mapping`, nodes addressed by position.
#[derive(Debug, Default)]
pub struct MessageGraph {
    nodes: Vec<RawNode>,
    positions: HashMap<String, usize>,
}

impl MessageGraph {
    /// Build the arena from the raw `mapping` object. Entries that are not
    /// JSON objects are dropped; fields with the wrong type read as absent.
    pub fn from_mapping(mapping: &Map<String, Value>) -> Self {
        let mut graph = Self::default();

        for (id, node) in mapping {
            let Some(obj) = node.as_object() else {
                debug!("Skipping malformed node {}", id);
                continue;
            };

            let children = obj
                .get("children")
                .and_then(|c| c.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(|s| s.to_string())
                        .collect()
                })
                .unwrap_or_default();

            graph.push(RawNode {
                id: id.clone(),
                parent: obj
                    .get("parent")
                    .and_then(|p| p.as_str())
                    .map(|s| s.to_string()),
                children,
                message: obj.get("message").and_then(RawMessage::from_json),
            });
        }

        graph
    }

    pub fn push(&mut self, node: RawNode) {
        self.positions.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RawNode> {
        self.positions.get(id).map(|&pos| &self.nodes[pos])
    }

    /// Node without a parent, or whose parent is missing from the graph.
    /// Several candidates resolve to the lexicographically smallest id.
    pub fn root(&self) -> Option<&RawNode> {
        self.nodes
            .iter()
            .filter(|node| match &node.parent {
                None => true,
                Some(parent) => !self.positions.contains_key(parent),
            })
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    /// Walk the primary path from the root, always taking the first child.
    pub fn flatten(&self) -> Vec<Message> {
        let mut messages = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.root();

        while let Some(node) = current {
            if !visited.insert(node.id.as_str()) {
                debug!("Cycle detected at node {}, stopping", node.id);
                break;
            }

            if let Some(message) = node.message.as_ref().and_then(RawMessage::to_message) {
                messages.push(message);
            }

            current = node.children.first().and_then(|id| self.get(id));
        }

        messages
    }
}

/// Parser for the `conversations.json` document of a ChatGPT export.
pub struct ExportParser;

impl Default for ExportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse every entry and return the collection sorted newest first.
    /// Entries that flatten to zero messages are dropped.
    pub fn parse_export(&self, json: &Value) -> Result<Vec<Conversation>, LoadError> {
        let entries = json.as_array().ok_or_else(|| {
            LoadError::UnexpectedShape("expected a top-level array of conversations".to_string())
        })?;

        let mut conversations: Vec<Conversation> = entries
            .iter()
            .filter_map(|entry| self.parse_conversation(entry))
            .collect();

        let dropped = entries.len() - conversations.len();
        if dropped > 0 {
            debug!("Dropped {} conversations without messages", dropped);
        }

        sort_newest_first(&mut conversations);
        Ok(conversations)
    }

    pub fn parse_conversation(&self, entry: &Value) -> Option<Conversation> {
        let obj = entry.as_object()?;

        let id = obj
            .get("id")
            .or_else(|| obj.get("conversation_id"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let title = obj
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let messages = match obj.get("mapping").and_then(|m| m.as_object()) {
            Some(mapping) if !mapping.is_empty() => MessageGraph::from_mapping(mapping).flatten(),
            _ => self.parse_flat_messages(obj.get("messages")),
        };

        if messages.is_empty() {
            trace!("Conversation {:?} has no messages", id);
            return None;
        }

        Some(Conversation {
            id,
            title,
            create_time: obj.get("create_time").and_then(|v| v.as_f64()),
            update_time: obj.get("update_time").and_then(|v| v.as_f64()),
            model_slug: obj
                .get("default_model_slug")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            messages,
        })
    }

    /// Older exports carry a plain `messages` array instead of a tree.
    fn parse_flat_messages(&self, messages: Option<&Value>) -> Vec<Message> {
        let Some(messages) = messages.and_then(|m| m.as_array()) else {
            return Vec::new();
        };

        messages
            .iter()
            .filter_map(|msg| {
                let role = msg
                    .get("role")
                    .and_then(|r| r.as_str())
                    .or_else(|| {
                        msg.get("author")
                            .and_then(|a| a.get("role"))
                            .and_then(|r| r.as_str())
                    })
                    .map(|s| s.to_string());

                RawMessage {
                    role,
                    content: msg.get("content").cloned(),
                    create_time: msg.get("create_time").and_then(|v| v.as_f64()),
                }
                .to_message()
            })
            .collect()
    }
}

/// Stable sort by `create_time`, newest first; missing times sort as zero.
pub fn sort_newest_first(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.created_at().total_cmp(&a.created_at()));
}

/// Extract readable text from a message `content` value.
///
/// A string is used as-is. An object contributes its `parts`: string parts and
/// objects with a string `text` field, joined with newlines. Anything else
/// (images, attachments) is dropped.
pub fn extract_text(content: &Value) -> String {
    if let Some(text) = content.as_str() {
        return text.to_string();
    }

    let Some(parts) = content.get("parts").and_then(|p| p.as_array()) else {
        return String::new();
    };

    parts
        .iter()
        .filter_map(|part| match part {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("text").and_then(|t| t.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
