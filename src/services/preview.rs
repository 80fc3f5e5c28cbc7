/*
 * Responsibility
 * - webview 用プレビュー: data= (URL エンコード済み JSON) を厳密にパース
 * - html は base64 → UTF-8、title はエスケープ、本文はそのまま埋め込む
 * - フッターの生成時刻は IST 表示
 */
use askama::Template;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Deserialize;
use thiserror::Error;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Missing data parameter")]
    MissingData,

    #[error("Invalid preview payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("html is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("html is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to render preview: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreviewPayload {
    pub html: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Template)]
#[template(path = "preview/page.html")]
struct PreviewPage<'a> {
    title: &'a str,
    body: &'a str,
    generated_at: &'a str,
}

#[derive(Template)]
#[template(path = "preview/error.html")]
struct PreviewErrorPage<'a> {
    message: &'a str,
}

/// Renders the full preview page. `now` stands in for a missing timestamp.
pub fn render_preview(data: Option<&str>, now: DateTime<Utc>) -> Result<String, PreviewError> {
    let data = data.filter(|d| !d.trim().is_empty()).ok_or(PreviewError::MissingData)?;
    let payload: PreviewPayload = serde_json::from_str(data)?;

    let body = String::from_utf8(STANDARD.decode(payload.html.trim())?)?;
    let title = payload
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or("Preview");
    let generated_at = format_ist(payload.timestamp.unwrap_or(now));

    Ok(PreviewPage {
        title,
        body: &body,
        generated_at: &generated_at,
    }
    .render()?)
}

pub fn render_error(message: &str) -> String {
    PreviewErrorPage { message }
        .render()
        .unwrap_or_else(|_| format!("Error loading preview: {message}"))
}

fn format_ist(at: DateTime<Utc>) -> String {
    let ist = FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    at.with_timezone(&ist)
        .format("%A, %-d %B %Y at %-I:%M %P IST")
        .to_string()
}
