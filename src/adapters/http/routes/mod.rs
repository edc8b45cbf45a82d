pub mod payments;
pub mod promo_codes;
pub mod subscriptions;
pub mod webhooks;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/payments", payments::router())
        .nest("/webhooks", webhooks::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/promo-codes", promo_codes::router())
}
