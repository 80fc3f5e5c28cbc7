/*
 * Responsibility
 * - POST /newsletter: 新規購読 / 非アクティブの再購読 / アクティブなら 409
 * - GET /newsletter: アクティブ購読者数
 * - メール送信は outbox 経由 (レスポンスを待たせない)
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    api::v1::dto::newsletter::{SubscribeRequest, SubscribeResponse, SubscriberCountResponse},
    error::AppError,
    repos::error::RepoError,
    services::tasks::BackgroundTask,
    state::AppState,
};

fn already_subscribed() -> AppError {
    AppError::conflict(
        "ALREADY_SUBSCRIBED",
        "You're already subscribed! Check your inbox for curated blogs.",
    )
}

pub async fn subscribe(
    State(state): State<AppState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscribeResponse>, AppError> {
    let Json(req) = payload?;
    let new = req
        .validate()
        .map_err(|m| AppError::bad_request("INVALID_SUBSCRIPTION", m))?;

    match state.subscribers.find_by_email(&new.email).await? {
        Some(existing) if existing.is_active => Err(already_subscribed()),
        Some(_) => {
            let name = Some(new.name.as_str()).filter(|n| !n.is_empty());
            let topics = Some(new.topics.as_slice()).filter(|t| !t.is_empty());

            let row = state
                .subscribers
                .reactivate(&new.email, name, topics)
                .await?
                .ok_or(AppError::Internal)?;

            tracing::info!(email = %row.email, "subscriber reactivated");
            state.tasks.enqueue(BackgroundTask::WelcomeBack(row));

            Ok(Json(SubscribeResponse {
                success: true,
                message: "Welcome back! Your subscription has been reactivated.",
            }))
        }
        None => {
            let row = match state.subscribers.create(new).await {
                Ok(row) => row,
                // lost a race with a concurrent signup for the same email
                Err(RepoError::Conflict) => return Err(already_subscribed()),
                Err(e) => return Err(e.into()),
            };

            tracing::info!(email = %row.email, topics = row.topics.len(), "new subscriber");
            state.tasks.enqueue(BackgroundTask::Welcome(row.clone()));
            state.tasks.enqueue(BackgroundTask::AdminAlert(row));

            Ok(Json(SubscribeResponse {
                success: true,
                message: "You're in! Expect curated blogs that match your interests.",
            }))
        }
    }
}

pub async fn subscriber_count(
    State(state): State<AppState>,
) -> Result<Json<SubscriberCountResponse>, AppError> {
    let count = state.subscribers.count_active().await?;
    Ok(Json(SubscriberCountResponse {
        success: true,
        count,
    }))
}
