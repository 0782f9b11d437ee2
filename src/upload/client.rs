//! `DocumentUploader` trait and the REST-backed `ApiUploader`.
//!
//! `ApiUploader` posts a multipart form to `{base_url}/upload`:
//!
//! | field         | content                      |
//! |---------------|------------------------------|
//! | `file`        | the document bytes           |
//! | `description` | free text shown to reviewers |
//!
//! and expects `{"documents": [...], "summary": "...", "actionItems": [...]}`
//! back.  Missing response fields default to empty.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::UploadConfig;

use super::UploadError;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A document ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Read `path` from disk.  The file name and MIME type come from the path.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self {
            mime_type: mime_for(&file_name).to_string(),
            file_name,
            bytes,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadedDocument {
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadResponse {
    pub documents: Vec<UploadedDocument>,
    pub summary: String,
    pub action_items: Vec<String>,
}

// ---------------------------------------------------------------------------
// DocumentUploader trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait DocumentUploader: Send + Sync {
    async fn upload(&self, file: UploadFile, description: &str) -> Result<UploadResponse, UploadError>;
}

// ---------------------------------------------------------------------------
// ApiUploader
// ---------------------------------------------------------------------------

pub struct ApiUploader {
    client: reqwest::Client,
    config: UploadConfig,
}

impl ApiUploader {
    /// Build an uploader whose requests time out after
    /// `config.timeout_secs`.
    pub fn from_config(config: &UploadConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/upload", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl DocumentUploader for ApiUploader {
    async fn upload(&self, file: UploadFile, description: &str) -> Result<UploadResponse, UploadError> {
        let size = file.bytes.len();
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("description", description.to_string());

        let mut req = self.client.post(self.endpoint()).multipart(form);

        // Authorization only when a non-empty key is configured.
        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        log::info!("upload: sending {} ({size} bytes)", file.file_name);
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("upload: HTTP {status}: {body}");
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Parse(e.to_string()))?;

        log::debug!(
            "upload: {} document(s), {} action item(s)",
            parsed.documents.len(),
            parsed.action_items.len()
        );
        Ok(parsed)
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
