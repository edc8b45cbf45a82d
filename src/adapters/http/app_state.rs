use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    application::use_cases::{
        payments::PaymentUseCases, promo_codes::PromoCodeUseCases,
        subscriptions::SubscriptionUseCases, webhook_reconciler::WebhookReconciler,
    },
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub promo_code_use_cases: Arc<PromoCodeUseCases>,
    pub payment_use_cases: Arc<PaymentUseCases>,
    pub webhook_reconciler: Arc<WebhookReconciler>,
}

impl FromRef<AppState> for Arc<PaymentUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_use_cases.clone()
    }
}
