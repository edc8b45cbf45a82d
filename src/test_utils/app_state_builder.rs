//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` creates a minimal `AppState` with in-memory mocks
//! for testing HTTP endpoints.

use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        payments::PaymentUseCases, promo_codes::PromoCodeUseCases,
        subscriptions::SubscriptionUseCases, webhook_reconciler::WebhookReconciler,
    },
    domain::entities::{profile::Profile, promo_code::PromoCode, subscription::Subscription},
    infra::config::AppConfig,
    test_utils::{
        InMemoryCheckoutSessionRepo, InMemoryPaymentRepo, InMemoryProfileRepo,
        InMemoryPromoCodeRepo, InMemorySubscriptionRepo, MockPaymentGateway, RecordingNotifier,
    },
};

/// Handles to the mocks behind a built `AppState`, for seeding gateway
/// payments and asserting on writes.
pub struct TestMocks {
    pub gateway: Arc<MockPaymentGateway>,
    pub payments: Arc<InMemoryPaymentRepo>,
    pub subscriptions: Arc<InMemorySubscriptionRepo>,
    pub profiles: Arc<InMemoryProfileRepo>,
    pub promo_codes: Arc<InMemoryPromoCodeRepo>,
    pub notifier: Arc<RecordingNotifier>,
}

pub struct TestAppStateBuilder {
    profiles: Vec<Profile>,
    subscriptions: Vec<Subscription>,
    promo_codes: Vec<PromoCode>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            profiles: vec![],
            subscriptions: vec![],
            promo_codes: vec![],
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.push(profile);
        self
    }

    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn with_promo_code(mut self, promo_code: PromoCode) -> Self {
        self.promo_codes.push(promo_code);
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let subscriptions = Arc::new(InMemorySubscriptionRepo::new());
        for subscription in self.subscriptions {
            subscriptions.insert(subscription);
        }
        let profiles = Arc::new(InMemoryProfileRepo::new());
        for profile in self.profiles {
            profiles.insert(profile);
        }
        let promo_codes = Arc::new(InMemoryPromoCodeRepo::with_codes(self.promo_codes));
        let payments = Arc::new(InMemoryPaymentRepo::new());
        let checkout_sessions = Arc::new(InMemoryCheckoutSessionRepo::new());
        let gateway = Arc::new(MockPaymentGateway::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:3001".parse().unwrap(),
            database_url: String::new(),
            app_origin: Url::parse("http://localhost:3000").unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            yookassa_shop_id: "test_shop".to_string(),
            yookassa_secret_key: SecretString::new("test_secret".into()),
            gateway_timeout_secs: 30,
            trial_days: 14,
            resend_api_key: None,
            email_from: "PetCare <noreply@petcare.test>".to_string(),
        });

        let subscription_use_cases = Arc::new(SubscriptionUseCases::new(
            subscriptions.clone(),
            profiles.clone(),
            notifier.clone(),
            config.trial_days,
        ));

        let promo_code_use_cases = Arc::new(PromoCodeUseCases::new(promo_codes.clone()));

        let payment_use_cases = Arc::new(PaymentUseCases::new(
            payments.clone(),
            checkout_sessions,
            profiles.clone(),
            gateway.clone(),
            promo_code_use_cases.clone(),
            Url::parse("http://localhost:3000/payment/success").unwrap(),
        ));

        let webhook_reconciler = Arc::new(WebhookReconciler::new(
            gateway.clone(),
            payments.clone(),
            subscription_use_cases.clone(),
            promo_code_use_cases.clone(),
            profiles.clone(),
            notifier.clone(),
        ));

        let app_state = AppState {
            config,
            subscription_use_cases,
            promo_code_use_cases,
            payment_use_cases,
            webhook_reconciler,
        };

        let mocks = TestMocks {
            gateway,
            payments,
            subscriptions,
            profiles,
            promo_codes,
            notifier,
        };

        (app_state, mocks)
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
