use crate::config::{Config, ConfigError};
use crate::types::{
    Discussion, DiscussionCategory, DiscussionComment, DiscussionCommentRequest,
    DiscussionListOptions, DiscussionRequest, ListOptions, RateMeta,
};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to decode response (status {status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub retriable: bool,
}

/// One upstream round trip. The raw body is always kept so non-success
/// responses can be forwarded verbatim; `json` decodes it on demand.
#[derive(Debug, Clone)]
pub struct RestResponse<T> {
    pub status: StatusCode,
    pub body: String,
    pub rate: RateMeta,
    pub next_page: Option<u32>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> RestResponse<T> {
    pub fn json(&self) -> Result<T, ClientError> {
        serde_json::from_str(&self.body).map_err(|source| ClientError::Decode {
            status: self.status,
            source,
        })
    }
}

/// Thin GitHub REST client covering the discussion endpoints.
/// Every method issues exactly one HTTP request and never retries.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
    api_version: String,
}

pub fn build_client(cfg: &Config) -> Result<Client, ClientError> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_str(&cfg.user_agent)?);
    Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
        .map_err(ClientError::Build)
}

impl GitHubClient {
    pub fn new(cfg: &Config) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_client(cfg)?,
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
            token: cfg.token.clone(),
            api_version: cfg.api_version.clone(),
        })
    }

    fn repo_path(owner: &str, repo: &str, rest: &str) -> String {
        format!(
            "/repos/{}/{}/discussions{}",
            encode_path_segment(owner),
            encode_path_segment(repo),
            rest
        )
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = format!("{}{}", self.api_url, path);
        Ok(self
            .http
            .request(method, url)
            .header(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", self.token))?)
            .header("X-GitHub-Api-Version", &self.api_version)
            .header(
                ACCEPT,
                HeaderValue::from_static("application/vnd.github+json"),
            ))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<RestResponse<T>, ClientError> {
        let res = req.send().await.map_err(|e| {
            warn!("REST request error: {}", e);
            ClientError::Transport(e)
        })?;
        let status = res.status();
        let headers = res.headers().clone();
        let rate = extract_rate_from_rest(&headers);
        let next_page = next_page_from_link(&headers);
        let body = res.text().await.map_err(ClientError::Transport)?;
        debug!("REST status={} remaining={:?}", status, rate.remaining);
        Ok(RestResponse {
            status,
            body,
            rate,
            next_page,
            _kind: PhantomData,
        })
    }

    pub async fn list_discussions(
        &self,
        owner: &str,
        repo: &str,
        opts: &DiscussionListOptions,
    ) -> Result<RestResponse<Vec<Discussion>>, ClientError> {
        let req = self
            .request(Method::GET, &Self::repo_path(owner, repo, ""))?
            .query(&opts.query_pairs());
        self.send(req).await
    }

    pub async fn get_discussion(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<RestResponse<Discussion>, ClientError> {
        let req = self.request(
            Method::GET,
            &Self::repo_path(owner, repo, &format!("/{number}")),
        )?;
        self.send(req).await
    }

    pub async fn list_discussion_categories(
        &self,
        owner: &str,
        repo: &str,
        opts: &ListOptions,
    ) -> Result<RestResponse<Vec<DiscussionCategory>>, ClientError> {
        let req = self
            .request(Method::GET, &Self::repo_path(owner, repo, "/categories"))?
            .query(&opts.query_pairs());
        self.send(req).await
    }

    pub async fn list_discussion_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        opts: &ListOptions,
    ) -> Result<RestResponse<Vec<DiscussionComment>>, ClientError> {
        let req = self
            .request(
                Method::GET,
                &Self::repo_path(owner, repo, &format!("/{number}/comments")),
            )?
            .query(&opts.query_pairs());
        self.send(req).await
    }

    pub async fn create_discussion_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        comment: &DiscussionCommentRequest,
    ) -> Result<RestResponse<DiscussionComment>, ClientError> {
        let req = self
            .request(
                Method::POST,
                &Self::repo_path(owner, repo, &format!("/{number}/comments")),
            )?
            .json(comment);
        self.send(req).await
    }

    pub async fn create_discussion(
        &self,
        owner: &str,
        repo: &str,
        discussion: &DiscussionRequest,
    ) -> Result<RestResponse<Discussion>, ClientError> {
        let req = self
            .request(Method::POST, &Self::repo_path(owner, repo, ""))?
            .json(discussion);
        self.send(req).await
    }
}

pub fn map_status_to_error(status: StatusCode, message: String) -> ErrorInfo {
    let (code, retriable) = match status {
        StatusCode::BAD_REQUEST => ("bad_request", false),
        StatusCode::UNAUTHORIZED => ("unauthorized", false),
        StatusCode::FORBIDDEN => ("forbidden", false),
        StatusCode::NOT_FOUND => ("not_found", false),
        StatusCode::CONFLICT => ("conflict", false),
        StatusCode::UNPROCESSABLE_ENTITY => ("validation_failed", false),
        StatusCode::TOO_MANY_REQUESTS => ("rate_limited", true),
        s if s.is_server_error() => ("upstream_error", true),
        _ => ("unexpected_status", false),
    };
    ErrorInfo {
        code: code.to_string(),
        message,
        retriable,
    }
}

pub fn extract_rate_from_rest(headers: &HeaderMap) -> RateMeta {
    let remaining = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i32>().ok());
    let used = headers
        .get("x-ratelimit-used")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i32>().ok());
    let reset_at = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|epoch| chrono::DateTime::<chrono::Utc>::from_timestamp(epoch, 0))
        .map(|t| t.to_rfc3339());
    RateMeta {
        remaining,
        used,
        reset_at,
    }
}

/// Page number of the `rel="next"` entry of a `Link` header, if any.
pub fn next_page_from_link(headers: &HeaderMap) -> Option<u32> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        let url = url::Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse::<u32>().ok())
    })
}

pub fn encode_path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
