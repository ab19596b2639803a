use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use super::stats_analyzer::handle_get_stats;
use super::tools::{self, CallToolResponse};
use crate::shared::{Config, SearchEngine};

const PROTOCOL_VERSION: &str = "2024-11-05";

const INSTRUCTIONS: &str = "This server provides access to the user's ChatGPT conversation \
history. Use it to search past conversations, retrieve full conversation content, \
and get statistics about the user's ChatGPT usage.";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

// MCP Protocol Structures
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct InitializeResponse {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
    capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
    instructions: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ServerCapabilities {
    #[serde(default)]
    experimental: HashMap<String, Value>,
    #[serde(default)]
    logging: HashMap<String, Value>,
    tools: HashMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ServerInfo {
    name: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CallToolRequest {
    name: String,
    arguments: Option<Value>,
}

/// Serves the MCP tools over one loaded export.
///
/// The engine sits behind an `Arc`: each tool call works on the snapshot it
/// started with, and a reload publishes a fully built replacement.
pub struct McpServer {
    engine: Arc<SearchEngine>,
    export_path: PathBuf,
    config: Config,
}

impl McpServer {
    pub fn new(engine: SearchEngine, export_path: PathBuf, config: Config) -> Self {
        Self {
            engine: Arc::new(engine),
            export_path,
            config,
        }
    }

    pub fn engine(&self) -> Arc<SearchEngine> {
        Arc::clone(&self.engine)
    }

    async fn handle_initialize(&self, params: Option<Value>) -> Result<Value> {
        debug!("Handling initialize request: {:?}", params);

        let response = InitializeResponse {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                experimental: HashMap::new(),
                logging: HashMap::new(),
                tools: {
                    let mut tools = HashMap::new();
                    tools.insert("listChanged".to_string(), Value::Bool(false));
                    tools
                },
            },
            server_info: ServerInfo {
                name: "chatgpt-history-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: INSTRUCTIONS.to_string(),
        };

        Ok(serde_json::to_value(response)?)
    }

    async fn handle_list_tools(&self) -> Result<Value> {
        debug!("Handling list_tools request");
        let tools = tools::tool_definitions(&self.config);
        Ok(serde_json::json!({ "tools": tools }))
    }

    async fn handle_call_tool(&mut self, request: CallToolRequest) -> Result<Value> {
        debug!("Handling tool call: {}", request.name);

        let engine = self.engine();
        match request.name.as_str() {
            "chatgpt_search" => {
                tools::search_conversations(&engine, &self.config, request.arguments)
            }
            "chatgpt_get_conversation" => {
                tools::get_conversation(&engine, &self.config, request.arguments)
            }
            "chatgpt_list_conversations" => {
                tools::list_conversations(&engine, &self.config, request.arguments)
            }
            "chatgpt_stats" => handle_get_stats(&engine),
            "chatgpt_reload" => self.tool_reload().await,
            _ => CallToolResponse::error(format!("Unknown tool: {}", request.name)).into_value(),
        }
    }

    /// Rebuild from the export on a blocking thread, then swap the engine.
    /// On failure the current engine stays in place.
    async fn tool_reload(&mut self) -> Result<Value> {
        let path = self.export_path.clone();
        let loaded = tokio::task::spawn_blocking(move || SearchEngine::load(&path)).await?;

        match loaded {
            Ok(engine) => {
                let count = engine.len();
                self.engine = Arc::new(engine);
                info!("Reloaded {} conversations", count);
                CallToolResponse::text(format!(
                    "Reloaded {} conversations from {}",
                    count,
                    self.export_path.display()
                ))
                .into_value()
            }
            Err(e) => {
                warn!("Reload failed: {}", e);
                CallToolResponse::error(format!(
                    "Reload failed: {e}. Still serving the previously loaded {} conversations.",
                    self.engine.len()
                ))
                .into_value()
            }
        }
    }

    /// Returns `None` for notifications, which get no response.
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_list_tools().await,
            "tools/call" => {
                let params = request.params.unwrap_or_default();
                match serde_json::from_value::<CallToolRequest>(params) {
                    Ok(call) => self.handle_call_tool(call).await,
                    Err(e) => {
                        warn!("Invalid tools/call params: {}", e);
                        let message = format!("Invalid params: {e}");
                        let id = request.id?;
                        return Some(JsonRpcResponse::failure(Some(id), INVALID_PARAMS, message));
                    }
                }
            }
            method if method.starts_with("notifications/") => {
                debug!("Notification: {}", method);
                return None;
            }
            _ => {
                return request.id.map(|id| {
                    JsonRpcResponse::failure(
                        Some(id),
                        METHOD_NOT_FOUND,
                        format!("Unknown method: {}", request.method),
                    )
                });
            }
        };

        let id = request.id?;
        Some(match result {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(e) => JsonRpcResponse::failure(Some(id), INTERNAL_ERROR, e.to_string()),
        })
    }
}

/// Line-delimited JSON-RPC loop until `reader` hits EOF.
pub async fn serve<R, W>(server: &mut McpServer, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        debug!("Received line: {}", line);

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => server.handle_request(request).await,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                Some(JsonRpcResponse::failure(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
        };

        if let Some(response) = response {
            let response_json = serde_json::to_string(&response)?;
            debug!("Sending response: {}", response_json);

            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

pub async fn run_mcp_server(mut server: McpServer) -> Result<()> {
    info!("Serving {} conversations over stdio", server.engine().len());

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    serve(&mut server, stdin, tokio::io::stdout()).await
}
