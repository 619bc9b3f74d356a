//! Test helpers shared by the workspace: process/port plumbing and an in-process fake pixx.io API.

use anyhow::Context as _;
use axum::Router;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::Child;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub struct KillOnDrop(pub Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Pick an unused TCP port on localhost.
///
/// The port is not reserved; another process may bind it first.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

/// Poll an HTTP URL until it returns a 2xx/3xx status.
///
/// # Errors
///
/// Returns an error if `timeout_dur` elapses first.
pub async fn wait_http_ok(url: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout_dur {
            anyhow::bail!("timed out waiting for {url}");
        }

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
}

/// A request as seen by [`FakeDam`].
#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    /// Multipart text fields, in order.
    pub form: Vec<(String, String)>,
    /// Parsed JSON body, if the body was JSON.
    pub json: Option<Value>,
}

impl RecordedRequest {
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Json { status: u16, body: Value },
    Bytes {
        content_type: String,
        disposition: Option<String>,
        body: Vec<u8>,
    },
}

/// Canned responses keyed by method and exact path.
///
/// The literal `{base}` inside JSON string values is replaced with the server's base URL, so
/// replies can point back at the fake (e.g. a convert response naming a download URL).
#[derive(Debug, Default)]
pub struct FakeDamBuilder {
    routes: HashMap<(String, String), Reply>,
}

impl FakeDamBuilder {
    #[must_use]
    pub fn json(self, method: &str, path: &str, body: Value) -> Self {
        self.json_status(method, path, 200, body)
    }

    #[must_use]
    pub fn json_status(mut self, method: &str, path: &str, status: u16, body: Value) -> Self {
        self.routes.insert(
            (method.to_ascii_uppercase(), path.to_string()),
            Reply::Json { status, body },
        );
        self
    }

    #[must_use]
    pub fn bytes(
        mut self,
        path: &str,
        content_type: &str,
        disposition: Option<&str>,
        body: Vec<u8>,
    ) -> Self {
        self.routes.insert(
            ("GET".to_string(), path.to_string()),
            Reply::Bytes {
                content_type: content_type.to_string(),
                disposition: disposition.map(str::to_string),
                body,
            },
        );
        self
    }

    /// Bind `127.0.0.1:0` and serve until [`FakeDam::stop`] (or drop).
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(self) -> anyhow::Result<FakeDam> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind fake DAM")?;
        let addr = listener.local_addr()?;
        let base_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(DamState {
            base_url: base_url.clone(),
            routes: self.routes,
            requests: Arc::clone(&requests),
        });
        let app = Router::new().fallback(handle).with_state(state);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move { server.await });

        Ok(FakeDam {
            base_url,
            requests,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }
}

struct DamState {
    base_url: String,
    routes: HashMap<(String, String), Reply>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// In-process stand-in for the pixx.io REST API that records every request.
pub struct FakeDam {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<std::io::Result<()>>>,
}

impl FakeDam {
    #[must_use]
    pub fn builder() -> FakeDamBuilder {
        FakeDamBuilder::default()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Requests received for `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for FakeDam {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(State(state): State<Arc<DamState>>, req: Request) -> Response {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let query = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();
    // The header borrow must end before the body is consumed across an await.
    let (authorization, content_type) = {
        let header_value = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        (
            header_value(header::AUTHORIZATION),
            header_value(header::CONTENT_TYPE),
        )
    };

    let mut form = Vec::new();
    let mut json = None;
    if content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
    {
        if let Ok(mut multipart) = Multipart::from_request(req, &()).await {
            while let Ok(Some(field)) = multipart.next_field().await {
                let name = field.name().unwrap_or_default().to_string();
                let value = field.text().await.unwrap_or_default();
                form.push((name, value));
            }
        }
    } else if let Ok(bytes) = axum::body::to_bytes(req.into_body(), usize::MAX).await
        && !bytes.is_empty()
    {
        json = serde_json::from_slice(&bytes).ok();
    }

    if let Ok(mut log) = state.requests.lock() {
        log.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query,
            authorization,
            content_type,
            form,
            json,
        });
    }

    match state.routes.get(&(method, path.clone())) {
        Some(Reply::Json { status, body }) => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::OK);
            (status, axum::Json(with_base_url(body, &state.base_url))).into_response()
        }
        Some(Reply::Bytes {
            content_type,
            disposition,
            body,
        }) => {
            let mut builder = axum::http::Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type.as_str());
            if let Some(d) = disposition {
                builder = builder.header(header::CONTENT_DISPOSITION, d.as_str());
            }
            builder
                .body(Body::from(body.clone()))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({
                "success": false,
                "errorcode": "404",
                "errormessage": format!("No fake route for {path}")
            })),
        )
            .into_response(),
    }
}

fn with_base_url(body: &Value, base_url: &str) -> Value {
    match body {
        Value::String(s) => Value::String(s.replace("{base}", base_url)),
        Value::Array(items) => Value::Array(items.iter().map(|v| with_base_url(v, base_url)).collect()),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), with_base_url(v, base_url)))
                .collect(),
        ),
        other => other.clone(),
    }
}
