use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{AskRequest, AskResponse};

/// Endpoint used when neither the command line nor the environment names one.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";

const ASK_PATH: &str = "ask";

/// Something that can answer one user turn.
///
/// The conversation controller only talks to this trait, so tests and
/// alternative backends can stand in for the HTTP client.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Issues a single request for `request`.  Implementations do not retry.
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse> {
        (**self).ask(request).await
    }
}

/// HTTP client for the `/ask` endpoint.
#[derive(Debug, Clone)]
pub struct AskClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Option<Duration>,
}

impl AskClient {
    /// Create a new client for `endpoint` with no client-side timeout.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_options(endpoint, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = parse_endpoint(endpoint)?;
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The normalized endpoint base.
    pub fn endpoint(&self) -> &Url {
        &self.base_url
    }

    /// The full URL a request for `request` is sent to.
    pub fn ask_url(&self, request: &AskRequest) -> Result<Url> {
        let mut url = self.base_url.join(ASK_PATH)?;
        url.query_pairs_mut()
            .append_pair("model", request.model.as_str());
        Ok(url)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<serde_json::Value>,
        }

        // An unreadable body loses the detail but not the status mapping.
        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(status = status_code, error = %e, "failed to read error response body");
                String::new()
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .map(|detail| match detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });
        let error_message = if error_body.is_empty() {
            format!("HTTP {status_code}")
        } else {
            error_body
        };

        match status_code {
            404 => Error::not_found(error_message),
            500 => Error::internal_server(error_message, detail),
            _ => Error::api(status_code, error_message),
        }
    }

    async fn send(&self, request: &AskRequest) -> Result<AskResponse> {
        let url = self.ask_url(request)?;

        let response = self
            .client
            .post(url)
            .headers(self.default_headers())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        self.timeout.map(|t| t.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<AskResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl Transport for AskClient {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse> {
        CLIENT_REQUESTS.click();
        tracing::debug!(
            model = %request.model,
            has_previous_response_id = request.previous_response_id.is_some(),
            "sending ask request"
        );
        let start = Instant::now();
        let result = self.send(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok(response) => tracing::debug!(
                model = %request.model,
                elapsed_ms = start.elapsed().as_millis() as u64,
                has_previous_response_id = response.previous_response_id.is_some(),
                "ask request succeeded"
            ),
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                tracing::warn!(model = %request.model, error = %err, "ask request failed");
            }
        }
        result
    }
}

/// Parses an endpoint base URL, ensuring a trailing slash so `ask` joins below it.
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(
            format!("endpoint must be http or https, got {}", url.scheme()),
            Some("endpoint".to_string()),
        ));
    }
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
