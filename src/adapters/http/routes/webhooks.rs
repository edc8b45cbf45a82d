use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    application::use_cases::webhook_reconciler::{GatewayWebhookEvent, ReconcileOutcome},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/payment", post(payment_webhook))
}

/// Gateway notification endpoint. The gateway only cares about the status
/// code: 200 acknowledges the delivery, anything else schedules a retry.
/// Permanently-bad deliveries are acknowledged so they stop retrying;
/// transient failures bubble up as 5xx.
async fn payment_webhook(
    State(app_state): State<AppState>,
    Json(event): Json<GatewayWebhookEvent>,
) -> AppResult<impl IntoResponse> {
    match app_state.webhook_reconciler.handle(&event).await {
        Ok(ReconcileOutcome::Processed) | Ok(ReconcileOutcome::AlreadyProcessed) => {
            Ok(Json(json!({ "status": "success" })))
        }
        Ok(ReconcileOutcome::Ignored) => Ok(Json(json!({ "status": "ignored" }))),
        Err(error) if error.is_retryable() => Err(error),
        Err(error) => {
            tracing::warn!(%error, "Dropping unprocessable webhook delivery");
            Ok(Json(json!({ "status": "ignored" })))
        }
    }
}
