use crate::config::Settings;
use crate::discussions;
use crate::http::{map_status_to_error, ClientError, ErrorInfo, GitHubClient};
use crate::mcp::mcp_wrap;
use crate::params::ParamError;
use crate::types::RateMeta;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Produces a GitHub client on demand. Handlers only call it after their
/// parameters validated, so bad input never needs credentials or the network.
pub type GetClientFn = dyn Fn() -> Result<GitHubClient, ClientError> + Send + Sync;

/// Failures that abort a tool call entirely and surface as JSON-RPC errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to get GitHub client: {0}")]
    Client(#[source] ClientError),
    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: ClientError,
    },
    #[error("failed to marshal {what}: {source}")]
    Marshal {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Result of a tool call that reached a verdict: either a payload or a
/// tool-level error the agent can read.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub structured: Value,
    pub is_error: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct Meta {
    pub has_more: bool,
    pub next_page: Option<u32>,
    pub rate: Option<RateMeta>,
}

impl ToolOutput {
    pub fn success(text: String, structured: Value) -> Self {
        Self {
            text,
            structured,
            is_error: false,
        }
    }

    pub fn param_error(err: ParamError) -> Self {
        let message = err.to_string();
        let info = ErrorInfo {
            code: "invalid_params".into(),
            message: message.clone(),
            retriable: false,
        };
        Self {
            text: message,
            structured: json!({ "error": info }),
            is_error: true,
        }
    }

    pub fn upstream_error(status: StatusCode, message: String, rate: &RateMeta) -> Self {
        let info = map_status_to_error(status, message.clone());
        let meta = Meta {
            rate: Some(rate.clone()),
            ..Meta::default()
        };
        Self {
            text: message,
            structured: json!({ "error": info, "meta": meta }),
            is_error: true,
        }
    }

    pub fn into_envelope(self, include_rate: bool) -> Value {
        mcp_wrap(self.structured, Some(self.text), self.is_error, include_rate)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ToolAnnotations {
    pub title: String,
    #[serde(rename = "readOnlyHint")]
    pub read_only_hint: bool,
    #[serde(rename = "openWorldHint")]
    pub open_world_hint: bool,
}

impl ToolDescriptor {
    fn new(name: &str, title: &str, description: &str, read_only: bool, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: schema,
            annotations: ToolAnnotations {
                title: title.into(),
                read_only_hint: read_only,
                open_world_hint: true,
            },
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.annotations.read_only_hint
    }

    #[cfg(test)]
    fn required(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

fn pagination_properties() -> Value {
    json!({
        "page": {"type": "number", "description": "Page number for pagination (min 1)", "minimum": 1},
        "perPage": {"type": "number", "description": "Results per page for pagination (min 1, max 100)", "minimum": 1, "maximum": 100}
    })
}

fn object_schema(mut properties: Value, paginated: bool, required: &[&str]) -> Value {
    if paginated {
        if let (Some(props), Value::Object(extra)) =
            (properties.as_object_mut(), pagination_properties())
        {
            props.extend(extra);
        }
    }
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
        "required": required,
    })
}

fn all_descriptors() -> Vec<ToolDescriptor> {
    let ping = ToolDescriptor::new(
        "ping",
        "Ping",
        "Health check; echoes a message.",
        true,
        object_schema(json!({"message": {"type": "string"}}), false, &[]),
    );

    let list_discussions = ToolDescriptor::new(
        "list_discussions",
        "List discussions",
        "List discussions in a GitHub repository with filtering options",
        true,
        object_schema(
            json!({
                "owner": {"type": "string", "description": "Repository owner"},
                "repo": {"type": "string", "description": "Repository name"},
                "direction": {"type": "string", "description": "Sort direction ('asc', 'desc')", "enum": ["asc", "desc"]},
                "category_id": {"type": "string", "description": "Filter by category ID"},
                "pinned": {"type": "string", "description": "Filter by pinned status ('true', 'false')", "enum": ["true", "false"]}
            }),
            true,
            &["owner", "repo"],
        ),
    );

    let get_discussion = ToolDescriptor::new(
        "get_discussion",
        "Get discussion",
        "Get details of a specific discussion in a GitHub repository",
        true,
        object_schema(
            json!({
                "owner": {"type": "string", "description": "The owner of the repository"},
                "repo": {"type": "string", "description": "The name of the repository"},
                "discussion_number": {"type": "number", "description": "The number of the discussion"}
            }),
            false,
            &["owner", "repo", "discussion_number"],
        ),
    );

    let get_categories = ToolDescriptor::new(
        "get_discussion_categories",
        "List discussion categories",
        "Get discussion categories in a GitHub repository",
        true,
        object_schema(
            json!({
                "owner": {"type": "string", "description": "Repository owner"},
                "repo": {"type": "string", "description": "Repository name"}
            }),
            true,
            &["owner", "repo"],
        ),
    );

    let get_comments = ToolDescriptor::new(
        "get_discussion_comments",
        "Get discussion comments",
        "Get comments for a GitHub discussion",
        true,
        object_schema(
            json!({
                "owner": {"type": "string", "description": "Repository owner"},
                "repo": {"type": "string", "description": "Repository name"},
                "discussion_number": {"type": "number", "description": "Discussion number"}
            }),
            true,
            &["owner", "repo", "discussion_number"],
        ),
    );

    let add_comment = ToolDescriptor::new(
        "add_discussion_comment",
        "Add discussion comment",
        "Add a comment to an existing discussion",
        false,
        object_schema(
            json!({
                "owner": {"type": "string", "description": "Repository owner"},
                "repo": {"type": "string", "description": "Repository name"},
                "discussion_number": {"type": "number", "description": "Discussion number to comment on"},
                "body": {"type": "string", "description": "Comment text"}
            }),
            false,
            &["owner", "repo", "discussion_number", "body"],
        ),
    );

    let create_discussion = ToolDescriptor::new(
        "create_discussion",
        "Create discussion",
        "Create a new discussion in a GitHub repository",
        false,
        object_schema(
            json!({
                "owner": {"type": "string", "description": "Repository owner"},
                "repo": {"type": "string", "description": "Repository name"},
                "title": {"type": "string", "description": "Discussion title"},
                "body": {"type": "string", "description": "Discussion body content"},
                "category_id": {"type": "string", "description": "Category ID for the discussion"}
            }),
            false,
            &["owner", "repo", "title", "body", "category_id"],
        ),
    );

    vec![
        ping,
        list_discussions,
        get_discussion,
        get_categories,
        get_comments,
        add_comment,
        create_discussion,
    ]
}

/// Tools visible under the given settings: ping only when enabled, write tools
/// only outside read-only mode.
pub fn tool_descriptors(settings: &Settings) -> Vec<ToolDescriptor> {
    all_descriptors()
        .into_iter()
        .filter(|t| t.name != "ping" || settings.enable_ping)
        .filter(|t| t.is_read_only() || !settings.read_only)
        .collect()
}

pub fn is_enabled(settings: &Settings, name: &str) -> bool {
    tool_descriptors(settings).iter().any(|t| t.name == name)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingInput {
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingOutput {
    pub message: String,
}

fn ping(args: &Value) -> ToolOutput {
    let message = serde_json::from_value::<PingInput>(args.clone())
        .ok()
        .and_then(|p| p.message)
        .unwrap_or_else(|| "pong".to_string());
    let out = PingOutput { message };
    ToolOutput::success(out.message.clone(), json!(out))
}

/// Route a tool call by name. `None` means the tool is unknown or disabled.
pub async fn call_tool(
    name: &str,
    args: &Value,
    settings: &Settings,
    get_client: &GetClientFn,
) -> Option<Result<ToolOutput, ToolError>> {
    if !is_enabled(settings, name) {
        return None;
    }
    let out = match name {
        "ping" => Ok(ping(args)),
        "list_discussions" => discussions::list_discussions(get_client, args).await,
        "get_discussion" => discussions::get_discussion(get_client, args).await,
        "get_discussion_categories" => {
            discussions::get_discussion_categories(get_client, args).await
        }
        "get_discussion_comments" => discussions::get_discussion_comments(get_client, args).await,
        "add_discussion_comment" => discussions::add_discussion_comment(get_client, args).await,
        "create_discussion" => discussions::create_discussion(get_client, args).await,
        _ => return None,
    };
    Some(out)
}
