//! Authenticated JSON client for a single base URL.
//!
//! # Design
//! `JsonClient` holds only its immutable `ClientConfig` and a transport, so
//! no call can observe state left behind by an earlier one. Every exchange is
//! split into `build_*` (produces an `HttpRequest`), `send` (transport
//! round-trip) and `parse_json` (status check and decode). `post` and `get`
//! chain the three.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Connection settings for a `JsonClient`.
///
/// An empty `username` means the client sends no `Authorization` header.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub insecure_skip_verify: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Skip validation of the server's TLS certificate chain.
    pub fn insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    fn authorization(&self) -> Option<String> {
        if self.username.is_empty() {
            return None;
        }
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        Some(format!("Basic {token}"))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .finish()
    }
}

/// JSON request/response client with optional HTTP Basic authentication.
#[derive(Debug, Clone)]
pub struct JsonClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl JsonClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.insecure_skip_verify);
        Self { config, transport }
    }
}

impl<T: Transport> JsonClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build a POST request. `endpoint` is appended to the base URL as is.
    /// A `()` or `None` payload is sent as the JSON text `null`.
    pub fn build_post<P: Serialize + ?Sized>(&self, endpoint: &str, payload: &P) -> Result<HttpRequest, ClientError> {
        let body = serde_json::to_string(payload).map_err(ClientError::Serialization)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(endpoint),
            headers: self.headers(),
            body: Some(body),
        })
    }

    /// Build a GET request. It carries no body but still declares a JSON
    /// content type.
    pub fn build_get(&self, endpoint: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.url(endpoint),
            headers: self.headers(),
            body: None,
        }
    }

    /// Execute a request and return the raw outcome without interpreting
    /// the status code.
    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "sending request");
        self.transport.execute(request)
    }

    pub fn post<P: Serialize + ?Sized>(&self, endpoint: &str, payload: &P) -> Result<Value, ClientError> {
        self.post_as(endpoint, payload)
    }

    pub fn get(&self, endpoint: &str) -> Result<Value, ClientError> {
        self.get_as(endpoint)
    }

    pub fn post_as<P, R>(&self, endpoint: &str, payload: &P) -> Result<R, ClientError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.build_post(endpoint, payload)?;
        parse_json(self.send(&request)?)
    }

    pub fn get_as<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, ClientError> {
        let request = self.build_get(endpoint);
        parse_json(self.send(&request)?)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("content-type".to_string(), JSON_CONTENT_TYPE.to_string())];
        if let Some(value) = self.config.authorization() {
            headers.push(("authorization".to_string(), value));
        }
        headers
    }
}

/// Decode a 200 response as UTF-8 JSON; every other status is
/// `RequestFailed` carrying the body as text.
pub fn parse_json<R: DeserializeOwned>(response: HttpResponse) -> Result<R, ClientError> {
    check_status(&response)?;
    serde_json::from_slice(&response.body).map_err(ClientError::MalformedResponse)
}

fn check_status(response: &HttpResponse) -> Result<(), ClientError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(ClientError::RequestFailed {
        status: response.status,
        body: response.text().into_owned(),
    })
}
