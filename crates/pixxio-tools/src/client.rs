//! Authenticated HTTP gateway to the pixx.io API.
//!
//! Every call carries `Authorization: Bearer <key>` from the per-call [`ApiContext`]. Bodies are
//! JSON or multipart form fields depending on what the endpoint expects; bodyless requests carry
//! no content type. Nothing is retried: failures are classified and returned as-is.

use crate::config::ApiContext;
use crate::error::{PixxioError, Result, UpstreamKind, redact_url};
use crate::model::{as_bool, as_text, pick};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Budget for metadata (JSON) calls.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(30);
/// Budget for binary transfers.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

const ERROR_EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub metadata: Duration,
    pub download: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            metadata: METADATA_TIMEOUT,
            download: DOWNLOAD_TIMEOUT,
        }
    }
}

/// Request body encodings used by the DAM.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    /// Sent as `multipart/form-data` text fields.
    Form(Vec<(String, String)>),
}

/// Raw bytes fetched from a download/preview URL.
#[derive(Debug, Clone)]
pub struct BinaryPayload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// File name advertised by `Content-Disposition`, if any.
    pub file_name: Option<String>,
}

#[derive(Clone)]
pub struct PixxioClient {
    http: Client,
    timeouts: Timeouts,
}

impl PixxioClient {
    /// # Errors
    ///
    /// Returns [`PixxioError::Config`] if the underlying HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        Self::with_timeouts(Timeouts::default())
    }

    /// # Errors
    ///
    /// Returns [`PixxioError::Config`] if the underlying HTTP client cannot be constructed.
    pub fn with_timeouts(timeouts: Timeouts) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("pixxio-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PixxioError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, timeouts })
    }

    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// GET an endpoint and return its JSON body.
    ///
    /// # Errors
    ///
    /// See [`PixxioClient::request`].
    pub async fn get_json(
        &self,
        ctx: &ApiContext,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value> {
        self.request(ctx, Method::GET, path, query, None).await
    }

    /// Issue a request against `<base_url><api_prefix><path>` and return the parsed JSON body.
    ///
    /// A successful response that is not JSON is returned as a JSON string; an empty one as
    /// `null`. A 2xx body of the form `{"success": false, ...}` is treated as an upstream error.
    ///
    /// # Errors
    ///
    /// - [`PixxioError::Timeout`] if the call exceeds the metadata budget
    /// - [`PixxioError::Transport`] on connection failures
    /// - [`PixxioError::Upstream`] on non-2xx statuses (or an explicit `success: false`)
    pub async fn request(
        &self,
        ctx: &ApiContext,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<RequestBody>,
    ) -> Result<Value> {
        let mut url = ctx.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        let timeout = self.timeouts.metadata;
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(ctx.api_key())
            .timeout(timeout);
        request = match body {
            Some(RequestBody::Json(v)) => request.json(&v),
            Some(RequestBody::Form(fields)) => {
                let form = fields
                    .into_iter()
                    .fold(reqwest::multipart::Form::new(), |form, (k, v)| form.text(k, v));
                request.multipart(form)
            }
            None => request,
        };

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| PixxioError::from_reqwest(&e, timeout))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PixxioError::from_reqwest(&e, timeout))?;

        debug!(
            method = %method,
            url = %redact_url(&url),
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pixx.io request"
        );

        if !status.is_success() {
            let err = upstream_error(status, &text);
            warn!(method = %method, url = %redact_url(&url), error = %err, "pixx.io request failed");
            return Err(err);
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        let body: Value =
            serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()));

        if let Some(err) = reported_failure(status, &body) {
            warn!(method = %method, url = %redact_url(&url), error = %err, "pixx.io reported failure");
            return Err(err);
        }
        Ok(body)
    }

    /// Fetch binary content from an absolute URL with the download budget.
    ///
    /// The bearer token is only attached when `url` points at the configured DAM host, so
    /// pre-signed CDN links never receive the API key.
    ///
    /// # Errors
    ///
    /// - [`PixxioError::Validation`] if `url` is not an absolute `http(s)` URL
    /// - [`PixxioError::Timeout`] / [`PixxioError::Transport`] / [`PixxioError::Upstream`] as for
    ///   [`PixxioClient::request`]
    pub async fn fetch_binary(&self, ctx: &ApiContext, url: &str) -> Result<BinaryPayload> {
        let url = Url::parse(url)
            .map_err(|e| PixxioError::Validation(format!("Invalid download URL: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(PixxioError::Validation(format!(
                "Unsupported download URL scheme '{}'",
                url.scheme()
            )));
        }

        let timeout = self.timeouts.download;
        let mut request = self.http.get(url.clone()).timeout(timeout);
        if same_origin(&url, ctx.base_url()) {
            request = request.bearer_auth(ctx.api_key());
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| PixxioError::from_reqwest(&e, timeout))?;
        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = upstream_error(status, &text);
            warn!(url = %redact_url(&url), error = %err, "pixx.io download failed");
            return Err(err);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PixxioError::from_reqwest(&e, timeout))?;

        debug!(
            url = %redact_url(&url),
            status = status.as_u16(),
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pixx.io download"
        );

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(content_disposition_filename);

        Ok(BinaryPayload {
            bytes: bytes.to_vec(),
            content_type,
            file_name,
        })
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Build the error for a non-2xx response.
///
/// A structured body (`errorcode`/`errormessage`, `code`/`message`, or a nested `error` object)
/// supplies the code and message; anything else is reported as a truncated excerpt.
fn upstream_error(status: StatusCode, body: &str) -> PixxioError {
    let code = status.as_u16();
    let kind = UpstreamKind::from_status(code);

    if let Some((err_code, message)) = structured_error(body) {
        return PixxioError::Upstream {
            status: code,
            kind,
            code: err_code,
            message,
        };
    }

    let excerpt = excerpt(body);
    let message = if excerpt.is_empty() {
        String::new()
    } else {
        format!("Response body: {excerpt}")
    };
    PixxioError::Upstream {
        status: code,
        kind,
        code: None,
        message,
    }
}

fn structured_error(body: &str) -> Option<(Option<String>, String)> {
    let v: Value = serde_json::from_str(body.trim()).ok()?;
    let obj = v.as_object()?;
    let obj = match obj.get("error") {
        Some(Value::Object(inner)) => inner,
        _ => obj,
    };
    let code = pick(obj, &["errorcode", "errorCode", "code"]).and_then(as_text);
    let message = pick(obj, &["errormessage", "errorMessage", "message", "error", "help"])
        .and_then(as_text);
    if code.is_none() && message.is_none() {
        return None;
    }
    Some((code, message.unwrap_or_default()))
}

fn reported_failure(status: StatusCode, body: &Value) -> Option<PixxioError> {
    let obj = body.as_object()?;
    let success = pick(obj, &["success"]).and_then(as_bool)?;
    if success {
        return None;
    }
    let code = pick(obj, &["errorcode", "errorCode", "code"]).and_then(as_text);
    let message = pick(obj, &["errormessage", "errorMessage", "message"])
        .and_then(as_text)
        .unwrap_or_else(|| "pixx.io reported an unsuccessful request".to_string());
    Some(PixxioError::Upstream {
        status: status.as_u16(),
        kind: UpstreamKind::Other,
        code,
        message,
    })
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= ERROR_EXCERPT_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(ERROR_EXCERPT_CHARS).collect();
    format!("{cut}...")
}

/// Extract a file name from a `Content-Disposition` header value.
///
/// `filename*=UTF-8''...` takes precedence over `filename=`. Path components are stripped.
#[must_use]
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in split_params(header) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if key == "filename*" {
            let encoded = value.rsplit_once("''").map_or(value, |(_, v)| v);
            extended = Some(percent_decode(encoded.trim_matches('"')));
        } else if key == "filename" {
            plain = Some(value.trim_matches('"').to_string());
        }
    }

    extended
        .or(plain)
        .map(|name| {
            name.rsplit(['/', '\\'])
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..")
}

/// Split header parameters on `;` outside double quotes.
fn split_params(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in header.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(header[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(header[start..].trim());
    parts
}

fn percent_decode(s: &str) -> String {
    url::form_urlencoded::parse(format!("x={}", s.replace('+', "%2B")).as_bytes())
        .next()
        .map_or_else(|| s.to_string(), |(_, v)| v.into_owned())
}
