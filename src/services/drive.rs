//! Proxy for public Google Drive downloads.
//!
//! The upstream body is forwarded as a stream; nothing is buffered in memory.

use async_trait::async_trait;
use axum::body::Body;
use thiserror::Error;

pub const DRIVE_DOWNLOAD_URL: &str = "https://drive.google.com/uc?export=download&id=";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("invalid file id")]
    InvalidFileId,

    #[error("drive request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("drive returned status {0}")]
    Status(u16),
}

/// Drive ids are URL-safe base64-ish tokens.
pub fn is_valid_file_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[async_trait]
pub trait PdfSource: Send + Sync {
    async fn fetch_pdf(&self, file_id: &str) -> Result<Body, DriveError>;
}

#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    base_url: String,
}

impl DriveClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: DRIVE_DOWNLOAD_URL.to_string(),
        }
    }
}

#[async_trait]
impl PdfSource for DriveClient {
    async fn fetch_pdf(&self, file_id: &str) -> Result<Body, DriveError> {
        if !is_valid_file_id(file_id) {
            return Err(DriveError::InvalidFileId);
        }

        let response = self
            .http
            .get(format!("{}{file_id}", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(file_id, status = status.as_u16(), "drive download failed");
            return Err(DriveError::Status(status.as_u16()));
        }

        Ok(Body::from_stream(response.bytes_stream()))
    }
}
