use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
};

#[derive(Deserialize)]
struct StartTrialPayload {
    user_id: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trial", post(start_trial))
        .route("/{id}/status", get(status))
        .route("/{id}/limits", get(limits))
        .route("/{id}/cancel", post(cancel))
}

async fn start_trial(
    State(app_state): State<AppState>,
    Json(payload): Json<StartTrialPayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::InvalidInput("user_id is required".into()))?;
    let subscription = app_state
        .subscription_use_cases
        .start_trial(user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

async fn status(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let view = app_state.subscription_use_cases.status(user_id).await?;
    Ok(Json(view))
}

async fn limits(
    State(app_state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let entitlement = app_state.subscription_use_cases.limits(user_id).await?;
    Ok(Json(entitlement))
}

async fn cancel(
    State(app_state): State<AppState>,
    Path(subscription_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let canceled = app_state
        .subscription_use_cases
        .cancel(subscription_id)
        .await?;
    Ok(Json(canceled))
}
