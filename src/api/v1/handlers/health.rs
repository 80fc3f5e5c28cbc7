/*
 * Responsibility
 * - GET /health: プロセスが応答できるかだけを見る (DB / Valkey には触れない)
 */
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
