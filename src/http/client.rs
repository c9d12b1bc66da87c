use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use reqwest_retry::Retryable;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::retry::RetryConfig;

/// A request to the platform, kept as plain data so it can be rebuilt for every attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(FilePart),
}

/// A single file sent as one part of a multipart form
#[derive(Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("len", &self.contents.len())
            .finish()
    }
}

impl ApiRequest {
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, part: FilePart) -> Self {
        self.body = RequestBody::Multipart(part);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Status and body of a completed call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{method} {url} failed after {attempts} attempts: {reason}")]
    RetriesExhausted {
        method: Method,
        url: String,
        attempts: u32,
        reason: String,
    },
    #[error("{method} {url} failed: {source}")]
    Request {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not build request for {url}: {reason}")]
    InvalidRequest { url: String, reason: String },
}

/// Narrow seam between the upload steps and the network.
///
/// Retry handling lives entirely behind this trait, so callers see either the final
/// response or a `TransportError`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Optional client timeouts; `None` keeps reqwest's defaults
#[derive(Debug, Clone, Default)]
pub struct TimeoutSettings {
    pub connect: Option<Duration>,
    pub request: Option<Duration>,
}

/// reqwest-backed transport that retries transient failures with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl RetryingHttpClient {
    pub fn new(retry: RetryConfig, timeouts: TimeoutSettings) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(connect) = timeouts.connect {
            builder = builder.connect_timeout(connect);
        }
        if let Some(request) = timeouts.request {
            builder = builder.timeout(request);
        }

        Ok(Self {
            client: builder.build()?,
            retry,
        })
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    fn build(&self, request: &ApiRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(value).map_err(|e| TransportError::InvalidRequest {
                    url: request.url.clone(),
                    reason: e.to_string(),
                })?;
                if request.header_value(CONTENT_TYPE.as_str()).is_none() {
                    builder = builder.header(CONTENT_TYPE, "application/json");
                }
                builder.body(bytes)
            }
            RequestBody::Multipart(file) => {
                let part = Part::bytes(file.contents.clone()).file_name(file.file_name.clone());
                builder.multipart(Form::new().part(file.field.clone(), part))
            }
        };

        Ok(builder)
    }
}

#[async_trait]
impl Transport for RetryingHttpClient {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(method = %request.method, url = %request.url, attempt, "Sending platform request");

            let outcome = self.build(request)?.send().await;

            match self.retry.classify(&outcome) {
                None | Some(Retryable::Fatal) => {
                    return match outcome {
                        Ok(response) => read_response(request, response).await,
                        Err(source) => Err(TransportError::Request {
                            method: request.method.clone(),
                            url: request.url.clone(),
                            source,
                        }),
                    };
                }
                Some(Retryable::Transient) => {
                    let reason = describe(&outcome);
                    if attempt >= self.retry.max_attempts() {
                        warn!(url = %request.url, attempts = attempt, %reason, "Retry budget exhausted");
                        return Err(TransportError::RetriesExhausted {
                            method: request.method.clone(),
                            url: request.url.clone(),
                            attempts: attempt,
                            reason,
                        });
                    }

                    let delay = self.retry.backoff_delay(attempt - 1);
                    warn!(
                        url = %request.url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %reason,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

async fn read_response(request: &ApiRequest, response: reqwest::Response) -> Result<ApiResponse, TransportError> {
    let status = response.status();
    let body = response.text().await.map_err(|source| TransportError::Request {
        method: request.method.clone(),
        url: request.url.clone(),
        source,
    })?;
    debug!(url = %request.url, %status, "Platform responded");
    Ok(ApiResponse { status, body })
}

fn describe(outcome: &Result<reqwest::Response, reqwest::Error>) -> String {
    match outcome {
        Ok(response) => format!("HTTP {}", response.status()),
        Err(error) if error.is_timeout() => format!("timed out: {error}"),
        Err(error) => format!("connection failed: {error}"),
    }
}
