//! The transport boundary and the bundled blocking implementation.
//!
//! # Design
//! A [`Transport`] turns one `HttpRequest` into one `HttpResponse`. The
//! bundled [`UreqTransport`] disables ureq's status-as-error behavior so
//! 4xx/5xx responses come back as data — status interpretation belongs to
//! the client, not the transport. Anything that prevents a response from
//! existing (DNS, connect, timeout) is a [`TransportError`].

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes HTTP round-trips on behalf of the client.
///
/// Implementations return `Err` only when no response was produced at all.
/// A non-2xx response is still a valid `HttpResponse`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport over a shared [`ureq::Agent`].
#[derive(Debug)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Build a transport whose requests time out after `timeout`, covering
    /// the whole call from connect to the last body byte.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.body.is_some() && !request.method.has_request_body() {
            return Err(TransportError(format!(
                "{} requests cannot carry a body",
                request.method.as_str()
            )));
        }

        let url = request.url.as_str();
        let headers = &request.headers;
        let result = match (request.method, &request.body) {
            (HttpMethod::Options, _) => with_headers(self.agent.options(url), headers).call(),
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Head, _) => with_headers(self.agent.head(url), headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Trace, _) => with_headers(self.agent.trace(url), headers).call(),
            (HttpMethod::Connect, _) => with_headers(self.agent.connect(url), headers).call(),
            (HttpMethod::Post, Some(bytes)) => {
                with_headers(self.agent.post(url), headers).send(&bytes[..])
            }
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(bytes)) => {
                with_headers(self.agent.put(url), headers).send(&bytes[..])
            }
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
            (HttpMethod::Patch, Some(bytes)) => {
                with_headers(self.agent.patch(url), headers).send(&bytes[..])
            }
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(url), headers).send_empty(),
        };

        let mut response = result.map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    headers
        .iter()
        .fold(builder, |b, (name, value)| b.header(name.as_str(), value.as_str()))
}
