//! Executing `HttpRequest`s over the network.
//!
//! # Design
//! `ThunderstoreClient` does not talk to the network directly. It asks a
//! `Connector` for a `Transport` the first time it needs one and keeps that
//! transport until it is closed. The default `HttpConnector` produces a
//! `ureq` agent configured with the client's timeout; tests substitute a
//! connector that answers from canned responses.

use std::io;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Upper bound on a response body. The unfiltered v1 package listing runs
/// to hundreds of megabytes.
const MAX_BODY_BYTES: u64 = 1024 * 1024 * 1024;

/// Opens a transport for a client configuration.
pub trait Connector {
    type Transport: Transport;

    fn connect(&self, config: &ClientConfig) -> Result<Self::Transport, ApiError>;
}

/// Performs one HTTP exchange.
///
/// Non-2xx statuses are returned as data, never as `Err`; errors are reserved
/// for failures of the exchange itself.
pub trait Transport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Connector backed by `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    type Transport = HttpTransport;

    fn connect(&self, config: &ClientConfig) -> Result<HttpTransport, ApiError> {
        Ok(HttpTransport::new(config))
    }
}

/// A `ureq` agent: pooled connections, redirects followed, one global
/// deadline per request.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout()))
            .max_redirects(10)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for HttpTransport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.agent.get(&request.url);
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let mut response = builder.call().map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()
            .map_err(transport_error)?;

        debug!(url = %request.url, status, bytes = body.len(), "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_error(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Timeout(_) => ApiError::Timeout,
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => ApiError::Timeout,
        other => ApiError::Transport(other.to_string()),
    }
}
