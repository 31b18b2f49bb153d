//! The `Resource` trait and response decoding.
//!
//! # Design
//! A domain type opts into the client by naming its URL prefix and,
//! optionally, parameters that ride along on every request for it. Decoding
//! is plain serde: a single object decodes from the response root, a list
//! decodes from the array under the `"result"` key. Shape mismatches come
//! back as [`ClientError::Decode`], never as a panic or an empty result.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::ClientError;
use crate::params::{JsonObject, Params};

/// Key under which list endpoints wrap their items.
pub const RESULT_KEY: &str = "result";

/// A domain type that can be fetched through the client.
pub trait Resource: DeserializeOwned {
    /// URL prefix for this type, e.g. `"/api/contacts"`. Every operation
    /// appends its path suffix to this.
    fn base_path() -> &'static str;

    /// Parameters attached to every request for this type. Per-call
    /// parameters are merged over these and win conflicts, see
    /// [`merge_params`](crate::params::merge_params).
    fn default_params() -> Params {
        Params::new()
    }
}

/// Decode a single `T` from a response object.
pub fn decode_one<T: DeserializeOwned>(object: JsonObject) -> Result<T, ClientError> {
    serde_json::from_value(Value::Object(object)).map_err(|e| {
        warn!(error = %e, "response decode failed");
        ClientError::Decode(e.to_string())
    })
}

/// Decode the array under the response object's `"result"` key into a
/// `Vec<T>`, preserving input order.
pub fn decode_many<T: DeserializeOwned>(mut object: JsonObject) -> Result<Vec<T>, ClientError> {
    let items = match object.remove(RESULT_KEY) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!("value under {RESULT_KEY:?} is not an array");
            return Err(ClientError::Decode(format!(
                "value under {RESULT_KEY:?} is not an array"
            )));
        }
        None => {
            warn!("response object has no {RESULT_KEY:?} key");
            return Err(ClientError::Decode(format!(
                "response object has no {RESULT_KEY:?} key"
            )));
        }
    };
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|e| {
                warn!(error = %e, "list item decode failed");
                ClientError::Decode(e.to_string())
            })
        })
        .collect()
}
