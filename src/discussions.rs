//! Discussion tools: parameter extraction, one REST call, status check,
//! verbatim re-serialization of the upstream payload.

use crate::http::RestResponse;
use crate::params::{ParamError, Params};
use crate::tools::{GetClientFn, Meta, ToolError, ToolOutput};
use crate::types::{
    DiscussionCommentRequest, DiscussionListOptions, DiscussionRequest, ListOptions,
};
use log::{debug, warn};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDiscussionsInput {
    pub owner: String,
    pub repo: String,
    pub opts: DiscussionListOptions,
}

impl ListDiscussionsInput {
    pub fn from_args(args: &Value) -> Result<Self, ParamError> {
        let p = Params::new(args)?;
        let owner = p.required_str("owner")?;
        let repo = p.required_str("repo")?;
        let direction = p.optional_str("direction")?;
        let category = p.optional_str("category_id")?;
        let pinned = match p.optional_str("pinned")?.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };
        Ok(Self {
            owner,
            repo,
            opts: DiscussionListOptions {
                direction,
                category,
                pinned,
                list: p.pagination()?,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionInput {
    pub owner: String,
    pub repo: String,
    pub discussion_number: u64,
}

impl DiscussionInput {
    pub fn from_args(args: &Value) -> Result<Self, ParamError> {
        let p = Params::new(args)?;
        Ok(Self {
            owner: p.required_str("owner")?,
            repo: p.required_str("repo")?,
            discussion_number: p.required_int("discussion_number")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPageInput {
    pub owner: String,
    pub repo: String,
    pub list: ListOptions,
}

impl RepoPageInput {
    pub fn from_args(args: &Value) -> Result<Self, ParamError> {
        let p = Params::new(args)?;
        Ok(Self {
            owner: p.required_str("owner")?,
            repo: p.required_str("repo")?,
            list: p.pagination()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionCommentsInput {
    pub owner: String,
    pub repo: String,
    pub discussion_number: u64,
    pub list: ListOptions,
}

impl DiscussionCommentsInput {
    pub fn from_args(args: &Value) -> Result<Self, ParamError> {
        let p = Params::new(args)?;
        Ok(Self {
            owner: p.required_str("owner")?,
            repo: p.required_str("repo")?,
            discussion_number: p.required_int("discussion_number")?,
            list: p.pagination()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCommentInput {
    pub owner: String,
    pub repo: String,
    pub discussion_number: u64,
    pub comment: DiscussionCommentRequest,
}

impl AddCommentInput {
    pub fn from_args(args: &Value) -> Result<Self, ParamError> {
        let p = Params::new(args)?;
        Ok(Self {
            owner: p.required_str("owner")?,
            repo: p.required_str("repo")?,
            discussion_number: p.required_int("discussion_number")?,
            comment: DiscussionCommentRequest {
                body: p.required_str("body")?,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDiscussionInput {
    pub owner: String,
    pub repo: String,
    pub discussion: DiscussionRequest,
}

impl CreateDiscussionInput {
    pub fn from_args(args: &Value) -> Result<Self, ParamError> {
        let p = Params::new(args)?;
        Ok(Self {
            owner: p.required_str("owner")?,
            repo: p.required_str("repo")?,
            discussion: DiscussionRequest {
                title: p.required_str("title")?,
                body: p.required_str("body")?,
                category_id: p.required_str("category_id")?,
            },
        })
    }
}

// Parse arguments or bail out with a tool-level parameter error.
macro_rules! parse_input {
    ($ty:ty, $args:expr) => {
        match <$ty>::from_args($args) {
            Ok(v) => v,
            Err(e) => {
                debug!("rejecting tool arguments: {}", e);
                return Ok(ToolOutput::param_error(e));
            }
        }
    };
}

/// Shape of the structured payload: a list under `items`, a single object under `item`.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Items,
    Item,
}

// The typed decode only checks the payload shape; the emitted value is the
// upstream JSON itself so null and unknown fields survive unchanged.
fn finish<T: DeserializeOwned>(
    resp: RestResponse<T>,
    expected: StatusCode,
    failure: &'static str,
    what: &'static str,
    shape: Shape,
) -> Result<ToolOutput, ToolError> {
    if resp.status != expected {
        warn!("{}: status {}", failure, resp.status);
        let message = format!("{}: {}", failure, resp.body);
        return Ok(ToolOutput::upstream_error(resp.status, message, &resp.rate));
    }
    resp.json().map_err(|source| ToolError::Upstream {
        context: failure,
        source,
    })?;
    let payload: Value =
        serde_json::from_str(&resp.body).map_err(|source| ToolError::Marshal { what, source })?;
    let text = serde_json::to_string(&payload).map_err(|source| ToolError::Marshal { what, source })?;
    let meta = Meta {
        has_more: resp.next_page.is_some(),
        next_page: resp.next_page,
        rate: Some(resp.rate),
    };
    let structured = match shape {
        Shape::Items => json!({ "items": payload, "meta": meta }),
        Shape::Item => json!({ "item": payload, "meta": meta }),
    };
    Ok(ToolOutput::success(text, structured))
}

fn upstream(context: &'static str) -> impl FnOnce(crate::http::ClientError) -> ToolError {
    move |source| ToolError::Upstream { context, source }
}

pub async fn list_discussions(
    get_client: &GetClientFn,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    const FAILURE: &str = "failed to list discussions";
    let input = parse_input!(ListDiscussionsInput, args);
    let client = get_client().map_err(ToolError::Client)?;
    let resp = client
        .list_discussions(&input.owner, &input.repo, &input.opts)
        .await
        .map_err(upstream(FAILURE))?;
    finish(resp, StatusCode::OK, FAILURE, "discussions", Shape::Items)
}

pub async fn get_discussion(
    get_client: &GetClientFn,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    const FAILURE: &str = "failed to get discussion";
    let input = parse_input!(DiscussionInput, args);
    let client = get_client().map_err(ToolError::Client)?;
    let resp = client
        .get_discussion(&input.owner, &input.repo, input.discussion_number)
        .await
        .map_err(upstream(FAILURE))?;
    finish(resp, StatusCode::OK, FAILURE, "discussion", Shape::Item)
}

pub async fn get_discussion_categories(
    get_client: &GetClientFn,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    const FAILURE: &str = "failed to get discussion categories";
    let input = parse_input!(RepoPageInput, args);
    let client = get_client().map_err(ToolError::Client)?;
    let resp = client
        .list_discussion_categories(&input.owner, &input.repo, &input.list)
        .await
        .map_err(upstream(FAILURE))?;
    finish(resp, StatusCode::OK, FAILURE, "categories", Shape::Items)
}

pub async fn get_discussion_comments(
    get_client: &GetClientFn,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    const FAILURE: &str = "failed to get discussion comments";
    let input = parse_input!(DiscussionCommentsInput, args);
    let client = get_client().map_err(ToolError::Client)?;
    let resp = client
        .list_discussion_comments(
            &input.owner,
            &input.repo,
            input.discussion_number,
            &input.list,
        )
        .await
        .map_err(upstream(FAILURE))?;
    finish(resp, StatusCode::OK, FAILURE, "comments", Shape::Items)
}

pub async fn add_discussion_comment(
    get_client: &GetClientFn,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    const FAILURE: &str = "failed to create discussion comment";
    let input = parse_input!(AddCommentInput, args);
    let client = get_client().map_err(ToolError::Client)?;
    let resp = client
        .create_discussion_comment(
            &input.owner,
            &input.repo,
            input.discussion_number,
            &input.comment,
        )
        .await
        .map_err(upstream(FAILURE))?;
    finish(resp, StatusCode::CREATED, FAILURE, "response", Shape::Item)
}

pub async fn create_discussion(
    get_client: &GetClientFn,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    const FAILURE: &str = "failed to create discussion";
    let input = parse_input!(CreateDiscussionInput, args);
    let client = get_client().map_err(ToolError::Client)?;
    let resp = client
        .create_discussion(&input.owner, &input.repo, &input.discussion)
        .await
        .map_err(upstream(FAILURE))?;
    finish(resp, StatusCode::CREATED, FAILURE, "response", Shape::Item)
}
