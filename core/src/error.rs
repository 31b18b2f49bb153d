//! Error types for the REST client.
//!
//! # Design
//! Every way a call can fail — bad configuration, transport trouble, a
//! non-2xx status, a payload that will not encode, a response that will not
//! decode — lands in one `ClientError`, so callers handle a single error
//! channel. Nothing aborts and nothing is swallowed: a response the client
//! cannot make sense of is an error, not a silent no-op.

use thiserror::Error;

/// Errors surfaced by [`RestClient`](crate::RestClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client or a request could not be configured: invalid base URL,
    /// or a path that does not form a valid URL against it.
    #[error("configuration error: {0}")]
    Config(String),

    /// The transport failed before any response was produced.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body could not be decoded into the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request payload could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Error produced by a [`Transport`](crate::transport::Transport)
/// implementation: DNS, connect, timeout, or protocol failures that prevent
/// an `HttpResponse` from existing at all.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);
