use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use url::Url;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{
            CreatePaymentParams, PaymentGatewayPort, PaymentIntent, PaymentIntentStatus,
        },
        use_cases::{
            promo_codes::{PromoCodeUseCases, calculate_discounted_price},
            subscriptions::ProfileRepo,
        },
    },
    domain::entities::{
        checkout_session::CheckoutSession,
        payment::{Payment, PaymentStatus},
        subscription::PlanType,
    },
};

/// Monthly PRO price in rubles.
pub const PRO_MONTHLY_PRICE: f64 = 299.0;
pub const PAYMENT_CURRENCY: &str = "RUB";

/// How long a checkout token stays resolvable after payment creation.
const CHECKOUT_SESSION_TTL_HOURS: i64 = 1;

// ============================================================================
// Repo Traits
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub gateway_payment_id: String,
    pub promo_code: Option<String>,
    pub discount_amount: f64,
}

/// Result of recording a confirmed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRecorded {
    /// First time this gateway payment was confirmed.
    Recorded,
    /// The row was already `succeeded`: a duplicate delivery.
    AlreadyRecorded,
}

#[async_trait]
pub trait PaymentRepo: Send + Sync {
    async fn insert_pending(&self, input: &NewPayment) -> AppResult<Payment>;

    /// Flip the payment identified by `gateway_payment_id` to `succeeded`.
    /// Upserts on the unique gateway id so a webhook arriving before the
    /// pending insert committed still lands, and a repeat delivery reports
    /// `AlreadyRecorded` instead of writing twice.
    async fn mark_succeeded(
        &self,
        gateway_payment_id: &str,
        user_id: Uuid,
        amount: f64,
        promo_code: Option<&str>,
    ) -> AppResult<PaymentRecorded>;

    /// Flip a non-succeeded payment to `failed`. A later retry of the same
    /// gateway payment may still mark it succeeded.
    async fn mark_failed(&self, gateway_payment_id: &str) -> AppResult<()>;

    async fn get_by_gateway_id(&self, gateway_payment_id: &str) -> AppResult<Option<Payment>>;
}

#[async_trait]
pub trait CheckoutSessionRepo: Send + Sync {
    async fn create(&self, session: &CheckoutSession) -> AppResult<()>;

    /// Look up a session by token, ignoring expired ones.
    async fn get_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<CheckoutSession>>;
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreatePaymentInput {
    pub user_id: Uuid,
    pub plan_type: PlanType,
    pub promo_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedPayment {
    pub payment_id: String,
    pub confirmation_url: Option<String>,
    pub amount: f64,
    pub original_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    pub checkout_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub currency: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl PaymentView {
    /// Local row merged with the gateway's live status. The gateway wins on
    /// status so a user landing on the success page sees the confirmation
    /// before the webhook is delivered; the ledger row still only changes
    /// through reconciliation.
    fn with_live_status(payment: &Payment, intent: &PaymentIntent) -> Self {
        PaymentView {
            payment_id: payment.gateway_payment_id.clone(),
            status: live_status(payment.status, intent),
            amount: payment.amount,
            currency: payment.currency.clone(),
            created_at: payment.created_at,
        }
    }
}

fn live_status(recorded: PaymentStatus, intent: &PaymentIntent) -> PaymentStatus {
    match intent.status {
        PaymentIntentStatus::Succeeded => PaymentStatus::Succeeded,
        PaymentIntentStatus::Canceled => PaymentStatus::Canceled,
        // Still in flight at the gateway; whatever we recorded stands.
        PaymentIntentStatus::Pending | PaymentIntentStatus::WaitingForCapture => recorded,
    }
}

// ============================================================================
// Use Cases
// ============================================================================

pub struct PaymentUseCases {
    payments: Arc<dyn PaymentRepo>,
    checkout_sessions: Arc<dyn CheckoutSessionRepo>,
    profiles: Arc<dyn ProfileRepo>,
    gateway: Arc<dyn PaymentGatewayPort>,
    promo_codes: Arc<PromoCodeUseCases>,
    /// Base URL the gateway redirects back to after confirmation.
    return_url: Url,
}

impl PaymentUseCases {
    pub fn new(
        payments: Arc<dyn PaymentRepo>,
        checkout_sessions: Arc<dyn CheckoutSessionRepo>,
        profiles: Arc<dyn ProfileRepo>,
        gateway: Arc<dyn PaymentGatewayPort>,
        promo_codes: Arc<PromoCodeUseCases>,
        return_url: Url,
    ) -> Self {
        Self {
            payments,
            checkout_sessions,
            profiles,
            gateway,
            promo_codes,
            return_url,
        }
    }

    /// Create a payment intent for a PRO month. The promo discount is
    /// resolved server-side; an invalid code rejects the request rather
    /// than silently charging full price.
    pub async fn create_payment(&self, input: &CreatePaymentInput) -> AppResult<CreatedPayment> {
        if input.plan_type != PlanType::Pro {
            return Err(AppError::InvalidInput(
                "Only the pro plan can be purchased".into(),
            ));
        }

        self.profiles
            .get_by_id(input.user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let original_amount = PRO_MONTHLY_PRICE;
        let mut amount = original_amount;
        let mut applied_code = None;

        if let Some(code) = input.promo_code.as_deref().filter(|c| !c.trim().is_empty()) {
            let validation = self.promo_codes.validate(code).await;
            if !validation.is_valid {
                let reason = validation
                    .error
                    .unwrap_or_else(|| "Invalid promo code".to_string());
                return Err(AppError::InvalidInput(reason));
            }
            amount = calculate_discounted_price(
                original_amount,
                validation.discount_value,
                validation.discount_type,
            );
            applied_code = Some(code.trim().to_uppercase());
        }

        let checkout_token = generate_checkout_token();
        let mut return_url = self.return_url.clone();
        return_url
            .query_pairs_mut()
            .append_pair("pc_token", &checkout_token);

        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), input.user_id.to_string());
        metadata.insert("plan_type".to_string(), input.plan_type.as_str().to_string());
        if let Some(code) = &applied_code {
            metadata.insert("promo_code".to_string(), code.clone());
        }

        let intent = self
            .gateway
            .create_payment(&CreatePaymentParams {
                amount,
                description: format!("PetCare PRO, 1 month ({})", PAYMENT_CURRENCY),
                user_id: input.user_id,
                plan_type: input.plan_type,
                return_url: return_url.to_string(),
                metadata,
            })
            .await?;

        let pending = self
            .payments
            .insert_pending(&NewPayment {
                user_id: input.user_id,
                amount,
                currency: PAYMENT_CURRENCY.to_string(),
                gateway_payment_id: intent.id.clone(),
                promo_code: applied_code.clone(),
                discount_amount: original_amount - amount,
            })
            .await;
        if let Err(error) = pending {
            // Close the orphaned intent so it does not stay payable at the
            // gateway while our side has no record of it.
            if let Err(cancel_error) = self.gateway.cancel_payment(&intent.id).await {
                tracing::warn!(
                    %cancel_error,
                    gateway_payment_id = %intent.id,
                    "Failed to cancel orphaned payment intent"
                );
            }
            return Err(error);
        }

        let session = CheckoutSession {
            id: Uuid::new_v4(),
            token: checkout_token.clone(),
            user_id: input.user_id,
            gateway_payment_id: intent.id.clone(),
            expires_at: Utc::now() + Duration::hours(CHECKOUT_SESSION_TTL_HOURS),
            created_at: None,
        };
        // A lost session only degrades the success page; the payment itself
        // is already tracked.
        if let Err(error) = self.checkout_sessions.create(&session).await {
            tracing::warn!(%error, gateway_payment_id = %intent.id, "Checkout session insert failed");
        }

        tracing::info!(
            user_id = %input.user_id,
            gateway_payment_id = %intent.id,
            amount,
            promo_code = ?applied_code,
            "Payment intent created"
        );

        Ok(CreatedPayment {
            payment_id: intent.id,
            confirmation_url: intent.confirmation_url,
            amount,
            original_amount,
            promo_code: applied_code,
            checkout_token,
        })
    }

    /// Proxy lookup: the local row scopes the id, the gateway supplies the
    /// live status.
    pub async fn get_payment(&self, gateway_payment_id: &str) -> AppResult<PaymentView> {
        let payment = self
            .payments
            .get_by_gateway_id(gateway_payment_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let intent = self.gateway.get_payment(gateway_payment_id).await?;
        Ok(PaymentView::with_live_status(&payment, &intent))
    }

    /// Resolve a checkout token from the gateway redirect into the payment
    /// it belongs to. Expired and unknown tokens are indistinguishable. The
    /// payment is re-fetched from the gateway rather than trusting anything
    /// the redirect carries.
    pub async fn resolve_checkout(&self, token: &str) -> AppResult<PaymentView> {
        let session = self
            .checkout_sessions
            .get_valid(token, Utc::now())
            .await?
            .ok_or(AppError::NotFound)?;

        let payment = self
            .payments
            .get_by_gateway_id(&session.gateway_payment_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let intent = self.gateway.get_payment(&session.gateway_payment_id).await?;

        Ok(PaymentView::with_live_status(&payment, &intent))
    }
}

/// Opaque URL-safe checkout token.
fn generate_checkout_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
