/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /blog, /recommendations, /newsletter, /send-email, /getpdf, /webview
 * - 管理操作の認証は handler 側の RequireAdmin extractor で行う
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    blog::{create_blog, get_blog, list_blogs, set_blog_flags, update_blog},
    health::health,
    newsletter::{subscribe, subscriber_count},
    recommendations::get_recommendations,
    utility::{get_pdf, send_email, webview_preview},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/blog", get(list_blogs).post(create_blog))
        .route("/blog/{slug}", get(get_blog).patch(update_blog))
        .route("/blog/{slug}/flags", post(set_blog_flags))
        .route("/recommendations/{slug}", get(get_recommendations))
        .route("/newsletter", get(subscriber_count).post(subscribe))
        .route("/send-email", post(send_email))
        .route("/getpdf", get(get_pdf))
        .route("/webview/preview", get(webview_preview))
}
