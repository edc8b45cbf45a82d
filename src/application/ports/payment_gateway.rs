use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{app_error::AppResult, domain::entities::subscription::PlanType};

// ============================================================================
// Port Types - Provider-agnostic payment types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

impl PaymentIntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentIntentStatus::Pending => "pending",
            PaymentIntentStatus::WaitingForCapture => "waiting_for_capture",
            PaymentIntentStatus::Succeeded => "succeeded",
            PaymentIntentStatus::Canceled => "canceled",
        }
    }

    /// Map a provider status string. Unknown statuses map to `Pending`, the
    /// only status that grants anything is `Succeeded`, never by default.
    pub fn from_gateway(s: &str) -> Self {
        match s {
            "pending" => PaymentIntentStatus::Pending,
            "waiting_for_capture" => PaymentIntentStatus::WaitingForCapture,
            "succeeded" => PaymentIntentStatus::Succeeded,
            "canceled" => PaymentIntentStatus::Canceled,
            _ => PaymentIntentStatus::Pending,
        }
    }
}

/// A payment intent as seen through the gateway port.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    /// Fixed two-decimal amount string, e.g. "299.00".
    pub amount: String,
    pub currency: String,
    /// URL the user is redirected to for confirmation.
    pub confirmation_url: Option<String>,
    pub paid: bool,
    pub metadata: HashMap<String, String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreatePaymentParams {
    pub amount: f64,
    pub description: String,
    pub user_id: Uuid,
    pub plan_type: PlanType,
    pub return_url: String,
    pub metadata: HashMap<String, String>,
}

// ============================================================================
// Payment Gateway Port
// ============================================================================

/// Payment gateway port - abstracts the external payment provider.
///
/// Each `create_payment` call carries a fresh idempotency key: retrying the
/// same logical request through this port creates a new monetary intent, so
/// de-duplication of retries is the caller's job.
#[async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    async fn create_payment(&self, params: &CreatePaymentParams) -> AppResult<PaymentIntent>;

    async fn get_payment(&self, payment_id: &str) -> AppResult<PaymentIntent>;

    async fn cancel_payment(&self, payment_id: &str) -> AppResult<PaymentIntent>;
}
