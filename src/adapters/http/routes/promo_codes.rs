use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::use_cases::promo_codes::NewPromoCode,
    domain::entities::promo_code::{DiscountType, PromoCode},
};

#[derive(Deserialize)]
struct ValidatePayload {
    code: Option<String>,
}

#[derive(Deserialize)]
struct CreatePayload {
    code: Option<String>,
    discount_type: Option<DiscountType>,
    discount_value: Option<f64>,
    max_uses: Option<i32>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct CodesResponse {
    items: Vec<PromoCode>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validate))
        .route("/", get(list).post(create))
        .route("/{id}/activate", post(activate))
        .route("/{id}/deactivate", post(deactivate))
}

async fn validate(
    State(app_state): State<AppState>,
    Json(payload): Json<ValidatePayload>,
) -> AppResult<impl IntoResponse> {
    let code = payload
        .code
        .ok_or_else(|| AppError::InvalidInput("code is required".into()))?;
    let result = app_state.promo_code_use_cases.validate(&code).await;
    Ok(Json(result))
}

async fn create(
    State(app_state): State<AppState>,
    Json(payload): Json<CreatePayload>,
) -> AppResult<impl IntoResponse> {
    let code = payload
        .code
        .ok_or_else(|| AppError::InvalidInput("code is required".into()))?;
    let discount_type = payload
        .discount_type
        .ok_or_else(|| AppError::InvalidInput("discount_type is required".into()))?;
    let discount_value = payload
        .discount_value
        .ok_or_else(|| AppError::InvalidInput("discount_value is required".into()))?;

    let created = app_state
        .promo_code_use_cases
        .create(&NewPromoCode {
            code,
            discount_type,
            discount_value,
            max_uses: payload.max_uses,
            expires_at: payload.expires_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn list(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let items = app_state.promo_code_use_cases.list().await?;
    Ok(Json(CodesResponse { items }))
}

async fn activate(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state.promo_code_use_cases.set_active(id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn deactivate(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    app_state.promo_code_use_cases.set_active(id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}
