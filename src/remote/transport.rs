//! Opaque request channel to the gateway.
//!
//! The gateway protocol is operation-name + JSON payload in, JSON out.
//! `Transport` abstracts the channel so tests can swap in an in-memory
//! mock; `HttpTransport` is the real thing, a blocking JSON POST per
//! call driven by an internal current-thread tokio runtime.

use hyper::body::Buf;
use hyper::{Body, Client, Request};
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::flog_trace;

/// Synchronous request channel carrying one gateway operation.
///
/// Implementations map failures to `RemoteUnavailable` with an empty
/// `entity`; the gateway layer fills in which entity was in flight.
pub trait Transport {
    fn call(&self, operation: &str, payload: &Value) -> Result<Value>;
}

/// JSON-over-HTTP transport to a gateway endpoint.
pub struct HttpTransport {
    endpoint: String,
    token: Option<String>,
    runtime: Runtime,
}

impl HttpTransport {
    pub fn new(endpoint: &str, token: Option<&str>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.map(|t| t.to_string()),
            runtime,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.endpoint, config.token.as_deref())
    }

    fn unavailable(&self, operation: &str, detail: String) -> Error {
        Error::RemoteUnavailable {
            operation: operation.to_string(),
            entity: String::new(),
            detail,
        }
    }

    async fn post(&self, url: &str, body: String) -> std::result::Result<Value, String> {
        let client = Client::new();
        let mut builder = Request::builder()
            .method("POST")
            .uri(url)
            .header("Content-Type", "application/json");
        if let Some(token) = &self.token {
            builder = builder.header("token", token.as_str());
        }
        let request = builder
            .body(Body::from(body))
            .map_err(|e| e.to_string())?;

        let response = client.request(request).await.map_err(|e| e.to_string())?;
        let status = response.status();
        let aggregated = hyper::body::aggregate(response)
            .await
            .map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("http status {}", status));
        }
        serde_json::from_reader(aggregated.reader()).map_err(|e| e.to_string())
    }
}

impl Transport for HttpTransport {
    fn call(&self, operation: &str, payload: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.endpoint, operation);
        let body = serde_json::to_string(payload)?;
        flog_trace!("POST {} ({} bytes)", url, body.len());

        self.runtime
            .block_on(self.post(&url, body))
            .map_err(|detail| self.unavailable(operation, detail))
    }
}
