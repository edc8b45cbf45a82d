use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Public origin of the web app; checkout return URLs are built from it.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    /// YooKassa shop credentials. Both are required: the service cannot
    /// verify webhooks without them, so startup fails fast when missing.
    pub yookassa_shop_id: String,
    pub yookassa_secret_key: SecretString,
    pub gateway_timeout_secs: u64,
    pub trial_days: i64,
    /// Resend API key for transactional email. Optional: without it the
    /// service runs with email delivery disabled.
    pub resend_api_key: Option<SecretString>,
    pub email_from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let yookassa_shop_id: String = get_env("YOOKASSA_SHOP_ID");
        let yookassa_secret_key: SecretString =
            SecretString::new(get_env::<String>("YOOKASSA_SECRET_KEY").into());
        let gateway_timeout_secs: u64 = get_env_default("GATEWAY_TIMEOUT_SECS", 30);

        let trial_days: i64 = get_env_default("TRIAL_DAYS", 14);

        let resend_api_key: Option<SecretString> = std::env::var("RESEND_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::new(k.into()));
        let email_from: String = get_env_default(
            "EMAIL_FROM",
            "PetCare <noreply@petcare.app>".to_string(),
        );

        Self {
            bind_addr,
            database_url,
            app_origin,
            cors_origin,
            yookassa_shop_id,
            yookassa_secret_key,
            gateway_timeout_secs,
            trial_days,
            resend_api_key,
            email_from,
        }
    }
}
