use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        email::{LoggingNotifier, resend::ResendNotifier},
        http::app_state::AppState,
        persistence::PostgresPersistence,
    },
    application::{
        ports::{notifications::SubscriptionNotifier, payment_gateway::PaymentGatewayPort},
        use_cases::{
            payments::{CheckoutSessionRepo, PaymentRepo, PaymentUseCases},
            promo_codes::{PromoCodeRepo, PromoCodeUseCases},
            subscriptions::{ProfileRepo, SubscriptionRepo, SubscriptionUseCases},
            webhook_reconciler::WebhookReconciler,
        },
    },
    infra::{
        config::AppConfig, db::init_db, yookassa_client::YookassaClient,
        yookassa_payment_adapter::YookassaPaymentAdapter,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = init_db(&config.database_url).await?;
    let postgres_arc = Arc::new(PostgresPersistence::new(pool));

    let subscription_repo = postgres_arc.clone() as Arc<dyn SubscriptionRepo>;
    let profile_repo = postgres_arc.clone() as Arc<dyn ProfileRepo>;
    let promo_code_repo = postgres_arc.clone() as Arc<dyn PromoCodeRepo>;
    let payment_repo = postgres_arc.clone() as Arc<dyn PaymentRepo>;
    let checkout_session_repo = postgres_arc.clone() as Arc<dyn CheckoutSessionRepo>;

    let gateway: Arc<dyn PaymentGatewayPort> = Arc::new(YookassaPaymentAdapter::new(
        YookassaClient::new(
            config.yookassa_shop_id.clone(),
            config.yookassa_secret_key.clone(),
            Duration::from_secs(config.gateway_timeout_secs),
        ),
        "RUB".to_string(),
    ));

    let notifier: Arc<dyn SubscriptionNotifier> = match &config.resend_api_key {
        Some(api_key) => Arc::new(ResendNotifier::new(
            api_key.clone(),
            config.email_from.clone(),
        )),
        None => {
            tracing::warn!("RESEND_API_KEY not set, email delivery disabled");
            Arc::new(LoggingNotifier)
        }
    };

    let subscription_use_cases = Arc::new(SubscriptionUseCases::new(
        subscription_repo,
        profile_repo.clone(),
        notifier.clone(),
        config.trial_days,
    ));

    let promo_code_use_cases = Arc::new(PromoCodeUseCases::new(promo_code_repo));

    let return_url = config
        .app_origin
        .join("payment/success")
        .map_err(|e| anyhow::anyhow!("Invalid APP_ORIGIN: {e}"))?;

    let payment_use_cases = Arc::new(PaymentUseCases::new(
        payment_repo.clone(),
        checkout_session_repo,
        profile_repo.clone(),
        gateway.clone(),
        promo_code_use_cases.clone(),
        return_url,
    ));

    let webhook_reconciler = Arc::new(WebhookReconciler::new(
        gateway,
        payment_repo,
        subscription_use_cases.clone(),
        promo_code_use_cases.clone(),
        profile_repo,
        notifier,
    ));

    Ok(AppState {
        config: Arc::new(config),
        subscription_use_cases,
        promo_code_use_cases,
        payment_use_cases,
        webhook_reconciler,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "petcare_billing=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
