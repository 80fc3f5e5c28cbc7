//! Client for the external ML service that embeds new posts and refreshes
//! related-post recommendations.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::MlConfig;
use crate::repos::blog_repo::BlogRow;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("ml request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ml service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid ml endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    slug: &'a str,
    title: &'a str,
    description: &'a str,
    content: &'a str,
    tags: &'a [String],
    is_starred: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbedResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recommendations_updated: u32,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_post(&self, post: &BlogRow) -> Result<EmbedResponse, EmbeddingError>;
}

#[derive(Clone)]
pub struct MlClient {
    http: reqwest::Client,
    endpoint: Url,
    secret: SecretString,
}

impl MlClient {
    pub fn new(http: reqwest::Client, config: &MlConfig) -> Result<Self, EmbeddingError> {
        Ok(Self {
            http,
            endpoint: embed_endpoint(&config.base_url)?,
            secret: config.secret.clone(),
        })
    }
}

fn embed_endpoint(base: &Url) -> Result<Url, url::ParseError> {
    // Url::join drops the last path segment unless the base ends with '/'.
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("embed-blog")
}

#[async_trait]
impl Embedder for MlClient {
    #[instrument(skip(self, post), fields(slug = %post.slug))]
    async fn embed_post(&self, post: &BlogRow) -> Result<EmbedResponse, EmbeddingError> {
        let request = EmbedRequest {
            slug: &post.slug,
            title: &post.title,
            description: &post.description,
            content: &post.content,
            tags: &post.tags,
            is_starred: post.is_starred,
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("X-API-Secret", self.secret.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        tracing::info!(
            updated = parsed.recommendations_updated,
            message = %parsed.message,
            "ml embedding accepted"
        );
        Ok(parsed)
    }
}
