//! Typed REST client over a JSON backend.
//!
//! # Overview
//! [`RestClient`] issues CRUD-style calls (`fetch_one`, `fetch_many`,
//! `update_one`, `delete_one`, `login_basic`, `upload`) against a JSON REST
//! backend and returns strongly typed values. A domain type opts in by
//! implementing [`Resource`]: a static base path plus default parameters
//! that every call merges its own parameters over.
//!
//! # Design
//! - Parameters route by method: JSON body for `POST`/`PUT`/`PATCH`, URL
//!   query string otherwise. The merge rule is deep — per-call values win
//!   scalar conflicts, lists concatenate defaults-then-call, nested objects
//!   merge recursively.
//! - The network sits behind the [`Transport`] trait; the bundled
//!   [`UreqTransport`] is blocking with a configurable whole-call timeout.
//! - Every failure (configuration, transport, non-2xx status, encode,
//!   decode) returns through [`ClientError`]. `*_background` variants
//!   deliver the same `Result` through an injectable callback scheduler,
//!   with the optional [`LoadingIndicator`] shown and hidden around the
//!   request lifecycle.
//!
//! ```no_run
//! use rest_core::{Params, Resource, RestClient};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Contact {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Resource for Contact {
//!     fn base_path() -> &'static str {
//!         "/api/contacts"
//!     }
//! }
//!
//! fn main() -> Result<(), rest_core::ClientError> {
//!     let client = RestClient::builder("http://localhost:3000").build()?;
//!     let contacts: Vec<Contact> = client.fetch_many("", Params::new(), false)?;
//!     println!("{} contacts", contacts.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod group;
pub mod hooks;
pub mod http;
pub mod multipart;
pub mod params;
pub mod resource;
pub mod transport;

pub use client::{RestClient, RestClientBuilder, DEFAULT_TIMEOUT};
pub use error::{ClientError, TransportError};
pub use group::group_by_section_key;
pub use hooks::{inline_scheduler, CallbackScheduler, Job, LoadingIndicator, NoopIndicator};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multipart::UploadFile;
pub use params::{merge_params, JsonObject, Params};
pub use resource::{decode_many, decode_one, Resource, RESULT_KEY};
pub use transport::{Transport, UreqTransport};
