//! Minimal JSON-over-HTTP client with safe logging, retries, and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout, retries
//! - Redacts sensitive headers/query params and never logs secret values
//! - Retries 429/5xx with exponential backoff and `Retry-After` support
//! - Optional *raw* response logging via `FALSEGUARD_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), falseguard_http::HttpError> {
//! let client = falseguard_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", falseguard_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: bearer values are sanitized before use, and logs only ever
//! include the auth kind (bearer/header/none), not the secret.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "FALSEGUARD_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

const SECRET_KEYS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "token",
    "secret",
    "client_secret",
    "bearer",
    "x-goog-api-key",
    "x-subscription-token",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SECRET_KEYS.contains(&lower.as_str())
}

/// Redact sensitive headers for logging.
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

fn redact_query(q: &[(&str, Cow<'_, str>)]) -> Vec<(String, String)> {
    q.iter()
        .map(|(k, v)| {
            let val = if is_secret(k) {
                "<redacted>".to_string()
            } else {
                v.as_ref().to_string()
            };
            ((*k).to_string(), val)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status carried by an API error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use falseguard_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Custom header (e.g., Brave: X-Subscription-Token, Gemini: x-goog-api-key)
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    None,
}

impl Auth<'_> {
    /// Build a header-based credential, validating the value up front.
    pub fn header(name: &'static str, value: &str) -> Result<Self, HttpError> {
        let mut value = HeaderValue::from_str(value.trim())
            .map_err(|e| HttpError::Build(format!("invalid {name} header: {e}")))?;
        value.set_sensitive(true);
        Ok(Auth::Header {
            name: HeaderName::from_static(name),
            value,
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Header { .. } => "header",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use falseguard_http::{Auth, RequestOpts};
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     retries: Some(1),
///     auth: Some(Auth::Bearer("demo")),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// A trailing slash is appended when missing so relative paths join
    /// under the base rather than replacing its last segment.
    ///
    /// ```no_run
    /// use falseguard_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com/v1")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET JSON with per-request options.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json::<(), T>(Method::GET, path, None, opts)
            .await
    }

    /// POST JSON with optional bearer auth.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let opts = RequestOpts {
            auth: bearer.map(Auth::Bearer),
            ..Default::default()
        };
        self.request_json(Method::POST, path, Some(body), opts).await
    }

    /// POST JSON with per-request options.
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, path, Some(body), opts).await
    }

    async fn request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let call = self.prepare(method, path, body, &opts)?;
        let policy = RetryPolicy {
            max_retries: opts.retries.unwrap_or(self.max_retries),
        };

        let mut attempt = 0usize;
        loop {
            match call.send_once(&self.inner, &opts, attempt).await {
                Verdict::Done(bytes) => return call.decode(&bytes),
                Verdict::Fail(err) => return Err(err),
                Verdict::Retryable { err, retry_after } => {
                    let Some(delay) = policy.next_delay(attempt, &err, retry_after) else {
                        tracing::warn!(req_id = %call.req_id, attempt, error = %err, "http.giving_up");
                        return Err(err);
                    };
                    attempt += 1;
                    tracing::warn!(
                        req_id = %call.req_id,
                        attempt,
                        max_retries = policy.max_retries,
                        backoff_ms = delay.as_millis() as u64,
                        error = %err,
                        "http.retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn prepare<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: &RequestOpts<'_>,
    ) -> Result<PreparedCall, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        let bearer = match &opts.auth {
            Some(Auth::Bearer(tok)) => Some(sanitize_api_key(tok)?),
            _ => None,
        };
        Ok(PreparedCall {
            method,
            url,
            body,
            bearer,
            timeout: opts.timeout.unwrap_or(self.default_timeout),
            req_id: format!("r{}", uuid::Uuid::new_v4().simple()),
        })
    }
}

/// Everything about a request that stays fixed across retries.
struct PreparedCall {
    method: Method,
    url: Url,
    body: Option<Vec<u8>>,
    bearer: Option<String>,
    timeout: Duration,
    req_id: String,
}

enum Verdict {
    Done(Vec<u8>),
    Retryable {
        err: HttpError,
        retry_after: Option<Duration>,
    },
    Fail(HttpError),
}

impl PreparedCall {
    async fn send_once(&self, client: &Client, opts: &RequestOpts<'_>, attempt: usize) -> Verdict {
        let mut rb = client
            .request(self.method.clone(), self.url.clone())
            .timeout(self.timeout);
        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }
        if let Some(bytes) = &self.body {
            rb = rb
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes.clone());
        }
        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }
        rb = match (&opts.auth, &self.bearer) {
            (Some(Auth::Bearer(_)), Some(tok)) => rb.bearer_auth(tok),
            (Some(Auth::Header { name, value }), _) => rb.header(name, value),
            _ => rb,
        };

        tracing::debug!(
            req_id = %self.req_id,
            attempt = attempt + 1,
            method = %self.method,
            endpoint = %format!("{}{}", self.url.host_str().unwrap_or("-"), self.url.path()),
            query = ?opts.query.as_deref().map(redact_query).unwrap_or_default(),
            auth = opts.auth.as_ref().map(Auth::kind).unwrap_or("none"),
            "http.send"
        );

        let started = Instant::now();
        let resp = match rb.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => return Verdict::Fail(HttpError::Timeout(self.timeout)),
            Err(e) => {
                return Verdict::Retryable {
                    err: HttpError::Network(e.to_string()),
                    retry_after: None,
                }
            }
        };

        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = match resp.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => {
                return Verdict::Retryable {
                    err: HttpError::Network(e.to_string()),
                    retry_after: None,
                }
            }
        };
        let upstream_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id = %self.req_id,
            %status,
            duration_ms = started.elapsed().as_millis() as u64,
            body_len = bytes.len(),
            upstream_id = %upstream_id,
            "http.recv"
        );
        if raw_enabled() {
            log_raw(&self.req_id, status, &headers, &bytes);
        }

        if status.is_success() {
            return Verdict::Done(bytes);
        }

        let err = HttpError::Api {
            status,
            message: extract_error_message(&bytes),
            request_id: upstream_id,
        };
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Verdict::Retryable {
                err,
                retry_after: retry_after_delay_secs(&headers).map(Duration::from_secs),
            }
        } else {
            tracing::warn!(req_id = %self.req_id, %status, body_snippet = %snip_body(&bytes), "http.error");
            Verdict::Fail(err)
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, HttpError> {
        serde_json::from_slice(bytes).map_err(|e| {
            let snippet = snip_body(bytes);
            tracing::warn!(req_id = %self.req_id, serde_err = %e, body_snippet = %snippet, "http.decode_error");
            HttpError::Decode(e.to_string(), snippet)
        })
    }
}

fn log_raw(req_id: &str, status: StatusCode, headers: &HeaderMap, bytes: &[u8]) {
    let shown = &bytes[..bytes.len().min(RAW_MAX_BODY)];
    tracing::info!(
        target: "http.raw",
        %req_id,
        %status,
        headers = ?redact_headers(headers),
        body = %String::from_utf8_lossy(shown),
        truncated = bytes.len() > RAW_MAX_BODY
    );
}

/// How long to wait before the next attempt, if there is one.
struct RetryPolicy {
    max_retries: usize,
}

impl RetryPolicy {
    // Rate-limited calls wait at least this long when no Retry-After is sent.
    const RATE_LIMIT_FLOOR: Duration = Duration::from_millis(1100);

    fn next_delay(
        &self,
        attempt: usize,
        err: &HttpError,
        retry_after: Option<Duration>,
    ) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        let base = backoff(attempt + 1);
        Some(match (retry_after, err.status()) {
            (Some(d), _) => d,
            (None, Some(StatusCode::TOO_MANY_REQUESTS)) => base.max(Self::RATE_LIMIT_FLOOR),
            (None, _) => base,
        })
    }
}

fn backoff(attempt: usize) -> Duration {
    Duration::from_millis(200u64.saturating_mul(1 << (attempt.saturating_sub(1)).min(10)))
}

/// Pull a human-readable message out of the common provider error envelopes:
/// `{"error":{"message":..}}` (OpenAI/Gemini), `{"detail":{"error":..}}` (Tavily),
/// and flat `{"message"|"detail"|"error": ".."}`.
fn extract_error_message(body: &[u8]) -> String {
    fn text_of(v: &Value) -> Option<String> {
        match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Object(map) => ["message", "error", "detail"]
                .iter()
                .find_map(|k| map.get(*k).and_then(text_of)),
            _ => None,
        }
    }

    serde_json::from_slice::<Value>(body)
        .ok()
        .as_ref()
        .and_then(text_of)
        .unwrap_or_else(|| snip_body(body))
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() > SNIPPET_MAX {
        let mut snip: String = text.chars().take(SNIPPET_MAX).collect();
        snip.push_str("...");
        snip
    } else {
        text.into_owned()
    }
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
