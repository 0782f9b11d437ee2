//! Reference-document upload.
//!
//! Separate from the streaming session: documents uploaded here are what
//! the backend later retrieves in stage 2.  The client is a plain REST call
//! through [`reqwest`]; the [`DocumentUploader`] trait lets callers swap in
//! a stub.

pub mod client;

pub use client::{ApiUploader, DocumentUploader, UploadFile, UploadResponse, UploadedDocument};

use thiserror::Error;

// ---------------------------------------------------------------------------
// UploadError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum UploadError {
    /// The file could not be read.
    #[error("cannot read upload file: {0}")]
    Io(String),

    /// HTTP transport or connection error.
    #[error("upload request failed: {0}")]
    Request(String),

    #[error("upload request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("upload rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("failed to parse upload response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UploadError::Timeout
        } else {
            UploadError::Request(e.to_string())
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(e: std::io::Error) -> Self {
        UploadError::Io(e.to_string())
    }
}
