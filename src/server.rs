use crate::config::{Config, Settings};
use crate::http::{ClientError, GitHubClient};
use crate::tools::{call_tool, tool_descriptors, GetClientFn, PROTOCOL_VERSION};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

// Minimal JSON-RPC 2.0 types
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Id {
    Str(String),
    Num(i64),
}

#[derive(Debug, Serialize, Deserialize)]
struct Request {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    id: Option<Id>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<Id>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

fn rpc_error(id: Option<Id>, code: i64, message: &str, data: Option<Value>) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.into(),
            data,
        }),
        id,
    }
}

fn rpc_ok(id: Option<Id>, result: Value) -> Response {
    Response {
        jsonrpc: "2.0".into(),
        result: Some(result),
        error: None,
        id,
    }
}

#[derive(Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

pub struct Server {
    settings: Settings,
    get_client: Box<GetClientFn>,
}

impl Server {
    pub fn new(settings: Settings, get_client: Box<GetClientFn>) -> Self {
        Self {
            settings,
            get_client,
        }
    }

    /// Server wired to the real GitHub API; credentials are read per call.
    pub fn from_env(settings: Settings) -> Self {
        Self::new(
            settings,
            Box::new(|| -> Result<GitHubClient, ClientError> {
                let cfg = Config::from_env()?;
                GitHubClient::new(&cfg)
            }),
        )
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle one raw message. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        let req: Request = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                return Some(rpc_error(
                    None,
                    PARSE_ERROR,
                    &format!("Parse error: {}", e),
                    None,
                ))
            }
        };
        debug!("Received method={}", req.method);
        if req.id.is_none() {
            debug!("Notification {} acknowledged", req.method);
            return None;
        }
        Some(self.dispatch(req).await)
    }

    async fn dispatch(&self, req: Request) -> Response {
        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "ping" => rpc_ok(req.id, serde_json::json!({})),
            other => rpc_error(
                req.id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", other),
                None,
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Id>) -> Response {
        rpc_ok(
            id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": "github-discussions-mcp",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Id>) -> Response {
        let tools = tool_descriptors(&self.settings);
        rpc_ok(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: Option<Id>, params: Value) -> Response {
        let Ok(call) = serde_json::from_value::<ToolCallParams>(params) else {
            return rpc_error(id, INVALID_PARAMS, "Invalid params", None);
        };
        debug!("tools/call name={}", call.name);
        match call_tool(
            &call.name,
            &call.arguments,
            &self.settings,
            &*self.get_client,
        )
        .await
        {
            None => rpc_error(
                id,
                METHOD_NOT_FOUND,
                &format!("Tool not found: {}", call.name),
                None,
            ),
            Some(Ok(out)) => rpc_ok(id, out.into_envelope(self.settings.include_rate)),
            Some(Err(e)) => {
                warn!("tool {} failed: {}", call.name, e);
                rpc_error(id, INTERNAL_ERROR, &e.to_string(), None)
            }
        }
    }
}

/// Serve newline-delimited JSON-RPC on stdin/stdout until stdin closes.
pub async fn run_stdio_server(server: Server) -> anyhow::Result<()> {
    info!(
        "Starting github-discussions-mcp stdio server; protocol={} read_only={}",
        PROTOCOL_VERSION,
        server.settings().read_only
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(resp) = server.handle_line(&line).await else {
            continue;
        };
        let mut payload = serde_json::to_string(&resp)?;
        payload.push('\n');
        out.write_all(payload.as_bytes()).await?;
        out.flush().await?;
    }
    info!("stdin closed; shutting down");
    Ok(())
}
