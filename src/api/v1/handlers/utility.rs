/*
 * Responsibility
 * - POST /send-email: 問い合わせフォームを管理者宛てに中継 (reply-to は送信者)
 * - GET /getpdf: Google Drive の PDF をプロキシ
 * - GET /webview/preview: base64 HTML をページ枠に入れて返す (失敗時は HTML のエラーページ)
 */
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    api::v1::dto::utility::{ContactRequest, ContactResponse, PdfParams, PreviewParams},
    error::AppError,
    services::preview,
    state::AppState,
};

pub async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<ContactResponse>, AppError> {
    let Json(req) = payload?;
    let msg = req
        .validate()
        .map_err(|m| AppError::bad_request("MISSING_FIELDS", m))?;

    state
        .notifier
        .send_contact_message(&msg.email, &msg.subject, &msg.message)
        .await?;

    Ok(Json(ContactResponse {
        success: true,
        message: "Email sent successfully!",
    }))
}

pub async fn get_pdf(
    State(state): State<AppState>,
    params: Result<Query<PdfParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    let file_id = params
        .fileid
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_FILE_ID", "Missing fileid parameter"))?;

    let body = state.pdf.fetch_pdf(&file_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"file.pdf\""),
        ],
        body,
    )
        .into_response())
}

pub async fn webview_preview(params: Result<Query<PreviewParams>, QueryRejection>) -> Response {
    let rendered = match params {
        Ok(Query(params)) => preview::render_preview(params.data.as_deref(), Utc::now()),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "preview query rejected");
            return preview_error(&rejection.body_text());
        }
    };

    match rendered {
        Ok(page) => (
            [(
                header::CACHE_CONTROL,
                "no-cache, no-store, must-revalidate",
            )],
            Html(page),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "preview rendering failed");
            preview_error(&e.to_string())
        }
    }
}

fn preview_error(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Html(preview::render_error(message))).into_response()
}
