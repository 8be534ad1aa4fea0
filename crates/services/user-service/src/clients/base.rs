//! JSON-over-HTTP client with status classification.

use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use common::{AppError, AppResult};

use crate::cache::{self, CacheHandler};

/// One outbound call, relative to the client's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub json: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            params: Vec::new(),
            json: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }
}

/// Sort a finished response into success or one of the external error kinds.
///
/// `body` is the raw payload; anything that is not JSON reads as `{}`.
pub fn classify_response(status: u16, body: &[u8]) -> AppResult<(u16, Value)> {
    let parsed = || {
        serde_json::from_slice::<Value>(body).unwrap_or_else(|_| Value::Object(Map::new()))
    };
    match status {
        400 => Err(AppError::ExternalBadRequest {
            status,
            detail: error_detail(parsed()),
        }),
        401..=499 => Err(AppError::ExternalClient {
            status,
            detail: error_detail(parsed()),
        }),
        500.. => Err(AppError::ExternalServer {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        }),
        _ => Ok((status, parsed())),
    }
}

/// `detail` when present and non-empty, otherwise `errors`.
fn error_detail(body: Value) -> Value {
    match body.get("detail") {
        Some(detail) if is_truthy(detail) => detail.clone(),
        _ => body.get("errors").cloned().unwrap_or(Value::Null),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}

/// Base client for one upstream API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client with an explicit request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform `request` and classify the response.
    pub async fn request(&self, request: ApiRequest) -> AppResult<(u16, Value)> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = %request.method, url = %url, "Outbound request");

        let mut builder = self
            .http
            .request(request.method, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;
        classify_response(status, &body)
    }

    /// [`request`](Self::request) behind the read-through cache bound to
    /// `handler`.
    pub async fn cached_request(
        &self,
        handler: &CacheHandler,
        request: ApiRequest,
    ) -> AppResult<(u16, Value)> {
        cache::cached_request(handler, || self.request(request)).await
    }

    /// Status of `GET /live`: the error status for classified failures, `0`
    /// when the upstream could not be reached.
    pub async fn get_alive(&self) -> u16 {
        match self.request(ApiRequest::get("/live")).await {
            Ok((status, _)) => status,
            Err(AppError::ExternalBadRequest { status, .. })
            | Err(AppError::ExternalClient { status, .. })
            | Err(AppError::ExternalServer { status, .. }) => status,
            Err(_) => 0,
        }
    }
}

fn transport_error(error: reqwest::Error) -> AppError {
    warn!("External API transport error: {}", error);
    if error.is_timeout() {
        AppError::service_unavailable("external API (timeout)")
    } else {
        AppError::service_unavailable("external API")
    }
}
