/*
 * Responsibility
 * - /blog 系の request/response DTO (JSON は camelCase)
 * - validate() は形式チェックのみ (slug 重複などは handler/repo 側)
 * - フラグ更新は query と body をマージ (query 優先)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    repos::blog_repo::{BlogRow, FlagsUpdate},
    services::{
        blog_query::Pagination,
        id_codec::{IdCodec, IdCodecError},
    },
};

/// Raw listing parameters; parsed leniently by `BlogListQuery::from_params`.
#[derive(Debug, Default, Deserialize)]
pub struct ListBlogsParams {
    pub page: Option<String>,
    pub search: Option<String>,
    pub starred: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListItem {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<String>,
    pub is_starred: bool,
    /// `YYYY-MM-DD`
    pub created_at: String,
}

impl BlogListItem {
    pub fn from_row(row: BlogRow, codec: &IdCodec) -> Result<Self, IdCodecError> {
        Ok(Self {
            id: codec.encode(row.id)?,
            created_at: row.created_at.format("%Y-%m-%d").to_string(),
            slug: row.slug,
            title: row.title,
            description: row.description,
            tags: row.tags,
            external: row.external.filter(|e| !e.is_empty()),
            is_starred: row.is_starred,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub posts: Vec<BlogListItem>,
    pub curated_posts: Vec<BlogListItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetail {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<String>,
    pub is_starred: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogDetail {
    pub fn from_row(row: BlogRow, codec: &IdCodec) -> Result<Self, IdCodecError> {
        Ok(Self {
            id: codec.encode(row.id)?,
            slug: row.slug,
            title: row.title,
            description: row.description,
            content: row.content,
            tags: row.tags,
            external: row.external.filter(|e| !e.is_empty()),
            is_starred: row.is_starred,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct BlogDetailResponse {
    pub success: bool,
    pub blog: BlogDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    pub title: Option<String>,
    /// Markdown content.
    pub body: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub external: Option<String>,
    #[serde(default)]
    pub is_starred: Option<bool>,
}

impl CreateBlogRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err("Title is required");
        }
        if self.body.as_deref().is_none_or(|b| b.trim().is_empty()) {
            return Err("Body is required (markdown format)");
        }
        if let Some(external) = self.external.as_deref().filter(|e| !e.trim().is_empty())
            && !is_http_url(external.trim())
        {
            return Err("external must be an absolute http(s) URL");
        }
        Ok(())
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}

#[derive(Debug, Serialize)]
pub struct CreateBlogResponse {
    pub success: bool,
    pub message: &'static str,
    pub slug: String,
    pub id: String,
}

/// Flag values from the query string. Any value other than `"true"` means false.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsQuery {
    pub is_starred: Option<String>,
    pub published: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsBody {
    pub is_starred: Option<bool>,
    pub published: Option<bool>,
}

/// Query values take precedence over body values for the same field.
pub fn merge_flags(query: &FlagsQuery, body: Option<&FlagsBody>) -> FlagsUpdate {
    let from_query = |v: &Option<String>| v.as_deref().map(|s| s == "true");

    FlagsUpdate {
        is_starred: from_query(&query.is_starred).or(body.and_then(|b| b.is_starred)),
        published: from_query(&query.published).or(body.and_then(|b| b.published)),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsView {
    pub slug: String,
    pub is_starred: bool,
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UpdateFlagsResponse {
    pub success: bool,
    pub message: &'static str,
    pub blog: FlagsView,
}
