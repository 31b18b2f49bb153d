//! multipart/form-data encoding for uploads.
//!
//! # Design
//! Uploads send the merged parameters as ordinary form fields and each file
//! as one binary part, framed per RFC 2046 with a random boundary. The
//! encoder produces the raw body bytes; the client attaches the matching
//! `Content-Type` header.

use uuid::Uuid;

use crate::params::{value_text, Params};

/// One binary part of an upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Form field name the server reads the part from.
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A fully encoded multipart/form-data body and the boundary it was framed
/// with.
#[derive(Debug)]
pub(crate) struct MultipartBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

/// Encode `params` as text parts and `files` as binary parts.
///
/// Scalar parameter values are written bare (a string value `"x"` becomes
/// the part body `x`); arrays and objects are written as their JSON text.
pub(crate) fn encode_multipart(params: &Params, files: &[UploadFile]) -> MultipartBody {
    let boundary = format!("----boundary-{}", Uuid::new_v4().simple());
    let mut bytes = Vec::new();

    for (name, value) in params {
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        bytes.extend_from_slice(value_text(value).as_bytes());
        bytes.extend_from_slice(b"\r\n");
    }

    for file in files {
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                file.field, file.file_name
            )
            .as_bytes(),
        );
        bytes.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
        bytes.extend_from_slice(&file.bytes);
        bytes.extend_from_slice(b"\r\n");
    }

    bytes.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    MultipartBody { boundary, bytes }
}
