use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::notifications::SubscriptionNotifier,
    infra::http_client::build_default_client,
};

#[derive(Clone)]
pub struct ResendNotifier {
    client: Client,
    api_key: SecretString,
    from: String,
}

impl ResendNotifier {
    pub fn new(api_key: SecretString, from: String) -> Self {
        Self {
            client: build_default_client(),
            api_key,
            from,
        }
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        let body = ResendReq {
            from: &self.from,
            to: [to],
            subject,
            html,
        };
        self.client
            .post("https://api.resend.com/emails")
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }
}

#[derive(Serialize)]
struct ResendReq<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl SubscriptionNotifier for ResendNotifier {
    async fn trial_started(&self, email: &str, trial_end: DateTime<Utc>) -> AppResult<()> {
        let html = format!(
            "<p>Your PetCare PRO trial has started. Enjoy full access until {}.</p>",
            trial_end.format("%d.%m.%Y")
        );
        self.send(email, "Your PetCare PRO trial has started", &html)
            .await
    }

    async fn subscription_activated(&self, email: &str, amount: f64) -> AppResult<()> {
        let html = format!(
            "<p>Thanks for your payment of {:.2} RUB. Your PetCare PRO subscription is active.</p>",
            amount
        );
        self.send(email, "PetCare PRO is active", &html).await
    }

    async fn subscription_canceled(
        &self,
        email: &str,
        end_date: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let html = match end_date {
            Some(end) => format!(
                "<p>Your PetCare PRO subscription is canceled. You keep access until {}.</p>",
                end.format("%d.%m.%Y")
            ),
            None => "<p>Your PetCare PRO subscription is canceled.</p>".to_string(),
        };
        self.send(email, "Your PetCare PRO subscription is canceled", &html)
            .await
    }
}
