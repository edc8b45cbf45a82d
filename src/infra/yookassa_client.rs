//! Thin typed client for the YooKassa Payments API (v3).
//!
//! Every mutating call carries a fresh `Idempotence-Key` header as the API
//! requires. Authentication is HTTP Basic with `shop_id:secret_key`.

use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    infra::http_client::build_client,
};

const YOOKASSA_API_BASE: &str = "https://api.yookassa.ru/v3";

#[derive(Clone)]
pub struct YookassaClient {
    client: Client,
    base_url: String,
    shop_id: String,
    secret_key: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YookassaPayment {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub paid: bool,
    pub amount: YookassaAmount,
    #[serde(default)]
    pub confirmation: Option<YookassaConfirmation>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YookassaAmount {
    pub value: String,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YookassaConfirmation {
    #[serde(default)]
    pub confirmation_url: Option<String>,
}

impl YookassaClient {
    pub fn new(shop_id: String, secret_key: SecretString, request_timeout: Duration) -> Self {
        Self {
            client: build_client(request_timeout),
            base_url: YOOKASSA_API_BASE.to_string(),
            shop_id,
            secret_key,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.shop_id,
            self.secret_key.expose_secret()
        ));
        format!("Basic {}", encoded)
    }

    pub async fn create_payment(
        &self,
        amount: f64,
        currency: &str,
        description: &str,
        return_url: &str,
        metadata: &HashMap<String, String>,
    ) -> AppResult<YookassaPayment> {
        let body = json!({
            "amount": {
                "value": format_amount(amount),
                "currency": currency,
            },
            "capture": true,
            "confirmation": {
                "type": "redirect",
                "return_url": return_url,
            },
            "description": description,
            "metadata": metadata,
        });

        let response = self
            .client
            .post(format!("{}/payments", self.base_url))
            .header("Authorization", self.auth_header())
            .header("Idempotence-Key", Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("YooKassa request failed: {e}")))?;

        self.handle_response(response).await
    }

    pub async fn get_payment(&self, payment_id: &str) -> AppResult<YookassaPayment> {
        let response = self
            .client
            .get(format!("{}/payments/{}", self.base_url, payment_id))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("YooKassa request failed: {e}")))?;

        self.handle_response(response).await
    }

    pub async fn cancel_payment(&self, payment_id: &str) -> AppResult<YookassaPayment> {
        let response = self
            .client
            .post(format!("{}/payments/{}/cancel", self.base_url, payment_id))
            .header("Authorization", self.auth_header())
            .header("Idempotence-Key", Uuid::new_v4().to_string())
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("YooKassa request failed: {e}")))?;

        self.handle_response(response).await
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "YooKassa API error");
            return Err(AppError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse YooKassa response");
            AppError::Internal(format!("Failed to parse YooKassa response: {e}"))
        })
    }
}

/// YooKassa takes amounts as strings with exactly two decimal places.
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}
