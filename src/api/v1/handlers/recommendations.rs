/*
 * Responsibility
 * - GET /recommendations/{slug}: 事前計算済みの関連記事を返す (読み取り専用)
 * - 未登録 slug は空配列 (エラーにしない)
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{api::v1::dto::recommendations::RecommendationsResponse, state::AppState};

pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> (StatusCode, Json<RecommendationsResponse>) {
    let slug = slug.trim().to_lowercase();

    match state.recommendations.find(&slug).await {
        Ok(found) => {
            let (recommendations, generated_at) = match found {
                Some(row) => (row.recommendations.0, Some(row.updated_at)),
                None => (Vec::new(), None),
            };
            (
                StatusCode::OK,
                Json(RecommendationsResponse {
                    success: true,
                    error: None,
                    slug,
                    recommendations,
                    generated_at,
                }),
            )
        }
        Err(e) => {
            tracing::error!(error = ?e, slug = %slug, "failed to fetch recommendations");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RecommendationsResponse {
                    success: false,
                    error: Some("Failed to fetch recommendations"),
                    slug,
                    recommendations: Vec::new(),
                    generated_at: None,
                }),
            )
        }
    }
}
