//! HTTPS requests over the pinned TLS context.
//!
//! Every call performs one request/response cycle and resolves to a decoded
//! body or a [`ClientError`]. Nothing is retried, redirects are not followed,
//! and no cookies are kept.
//!
//! The whole response body is buffered before it is classified. That is fine
//! for the small JSON/HTML documents this tool fetches but it bounds the
//! usable response size by available memory.

use std::time::Duration;

use hyper::ext::ReasonPhrase;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::error::{ClientError, Result};
use crate::tls::TlsClientContext;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("pinned-fetch/", env!("CARGO_PKG_VERSION"));

/// Accept header sent with every request.
pub const ACCEPT: &str = "application/json, text/plain, */*";

const DEFAULT_HTTPS_PORT: u16 = 443;

/// Used when the server sent no reason and the code has no standard one.
const UNKNOWN_STATUS_REASON: &str = "Unknown Status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// One request. A `timeout` here overrides the client-wide default.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub url: String,
    pub method: Method,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            body: None,
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            url: url.into(),
            method: Method::Post,
            body: Some(body),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Lifecycle of a single request. `Resolved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Connecting,
    Sending,
    AwaitingResponse,
    Buffering,
    Resolved,
    Rejected,
}

/// Where a request goes, split out of its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub url: Url,
    pub host: String,
    pub port: u16,
    /// Path plus `?query` when present
    pub path: String,
}

/// Validate and split a request URL. Only `https` URLs with a host are accepted.
pub fn parse_target(raw: &str) -> Result<RequestTarget> {
    if raw.trim().is_empty() {
        return Err(ClientError::InvalidUrl("Target URL cannot be empty".into()));
    }
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))?;

    if url.scheme() != "https" {
        return Err(ClientError::InvalidUrl(format!(
            "scheme \"{}\" is not supported; use https",
            url.scheme()
        )));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ClientError::InvalidUrl(format!("{raw}: missing host")))?
        .to_string();
    let port = url.port().unwrap_or(DEFAULT_HTTPS_PORT);
    let path = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };

    Ok(RequestTarget {
        url,
        host,
        port,
        path,
    })
}

/// Message for a status error: the reason phrase the server sent, else the
/// standard one for the code.
pub fn status_message(status: StatusCode, reason: Option<&str>) -> String {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .or(status.canonical_reason())
        .unwrap_or(UNKNOWN_STATUS_REASON)
        .to_string()
}

/// Reason phrase from the status line, when hyper kept a non-standard one.
fn reason_phrase(response: &reqwest::Response) -> Option<String> {
    response
        .extensions()
        .get::<ReasonPhrase>()
        .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
}

/// Classify a buffered response.
///
/// - status outside 2xx: `HttpStatusError`, body ignored
/// - `application/json`: parsed and re-emitted with two-space indentation
/// - anything else (including `text/html`): body as text
pub fn decode_response(
    status: StatusCode,
    reason: Option<&str>,
    content_type: &str,
    body: &[u8],
) -> Result<String> {
    if !status.is_success() {
        return Err(ClientError::HttpStatusError {
            status: status.as_u16(),
            message: status_message(status, reason),
        });
    }

    if content_type.to_ascii_lowercase().contains("application/json") {
        let json: Value = serde_json::from_slice(body).map_err(ClientError::ResponseDecodeError)?;
        return serde_json::to_string_pretty(&json).map_err(ClientError::ResponseDecodeError);
    }

    Ok(String::from_utf8_lossy(body).into_owned())
}

/// HTTPS client bound to one [`TlsClientContext`].
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PinnedHttpClient {
    inner: reqwest::Client,
    context: TlsClientContext,
    default_timeout: Option<Duration>,
}

impl PinnedHttpClient {
    /// Build the transport. A context with an empty root store is refused
    /// even though the factory never produces one.
    pub fn new(context: TlsClientContext) -> Result<Self> {
        if context.anchor_count() == 0 {
            return Err(ClientError::InvalidContext("no trust anchors loaded".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));

        let mut builder = reqwest::Client::builder()
            .use_preconfigured_tls(context.rustls_config().clone())
            .https_only(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none());
        if !context.keep_alive() {
            builder = builder.pool_max_idle_per_host(0);
        }

        let inner = builder
            .build()
            .map_err(|e| ClientError::InvalidContext(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            inner,
            context,
            default_timeout: None,
        })
    }

    /// Deadline for requests that do not carry their own.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn context(&self) -> &TlsClientContext {
        &self.context
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.send(RequestSpec::get(url)).await
    }

    pub async fn post(&self, url: &str, body: Value) -> Result<String> {
        self.send(RequestSpec::post(url, body)).await
    }

    /// Perform one request and decode its response.
    pub async fn send(&self, spec: RequestSpec) -> Result<String> {
        tracing::trace!(phase = ?RequestPhase::Idle, url = %spec.url, "Request queued");
        let outcome = self.execute(&spec).await;
        match &outcome {
            Ok(body) => tracing::debug!(
                phase = ?RequestPhase::Resolved,
                url = %spec.url,
                bytes = body.len(),
                "Request resolved"
            ),
            Err(e) => tracing::warn!(
                phase = ?RequestPhase::Rejected,
                url = %spec.url,
                kind = e.kind(),
                "Request error: {e}"
            ),
        }
        outcome
    }

    async fn execute(&self, spec: &RequestSpec) -> Result<String> {
        let target = parse_target(&spec.url)?;
        tracing::debug!(
            phase = ?RequestPhase::Connecting,
            method = ?spec.method,
            host = %target.host,
            port = target.port,
            path = %target.path,
            "Opening connection"
        );

        let mut request = self.inner.request(spec.method.into(), target.url);
        // A JSON null body is treated as no body at all
        let body = spec.body.as_ref().filter(|b| !b.is_null());
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = spec.timeout.or(self.default_timeout) {
            request = request.timeout(timeout);
        }

        tracing::debug!(phase = ?RequestPhase::Sending, has_body = body.is_some(), "Sending request");
        let response = request.send().await.map_err(ClientError::TransportError)?;

        let status = response.status();
        let reason = reason_phrase(&response);
        tracing::debug!(
            phase = ?RequestPhase::AwaitingResponse,
            status = status.as_u16(),
            "Response headers received"
        );
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        tracing::debug!(
            phase = ?RequestPhase::Buffering,
            status = status.as_u16(),
            content_type = %content_type,
            "Buffering response body"
        );
        let body = response.bytes().await.map_err(ClientError::TransportError)?;

        decode_response(status, reason.as_deref(), &content_type, &body)
    }
}
