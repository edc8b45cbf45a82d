use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::use_cases::payments::CreatePaymentInput,
    domain::entities::subscription::PlanType,
};

#[derive(Deserialize)]
struct CreatePaymentPayload {
    user_id: Option<Uuid>,
    plan_type: Option<String>,
    promo_code: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_payment))
        .route("/checkout/{token}", get(resolve_checkout))
        .route("/{payment_id}", get(get_payment))
}

async fn create_payment(
    State(app_state): State<AppState>,
    Json(payload): Json<CreatePaymentPayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::InvalidInput("user_id is required".into()))?;
    let plan_type = payload
        .plan_type
        .as_deref()
        .and_then(PlanType::parse)
        .ok_or_else(|| AppError::InvalidInput("plan_type must be 'pro'".into()))?;

    let created = app_state
        .payment_use_cases
        .create_payment(&CreatePaymentInput {
            user_id,
            plan_type,
            promo_code: payload.promo_code,
        })
        .await?;

    Ok(Json(created))
}

async fn get_payment(
    State(app_state): State<AppState>,
    Path(payment_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = app_state.payment_use_cases.get_payment(&payment_id).await?;
    Ok(Json(view))
}

async fn resolve_checkout(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = app_state.payment_use_cases.resolve_checkout(&token).await?;
    Ok(Json(view))
}
