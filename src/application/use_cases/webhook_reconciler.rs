use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            notifications::SubscriptionNotifier,
            payment_gateway::{PaymentGatewayPort, PaymentIntent, PaymentIntentStatus},
        },
        use_cases::{
            payments::{PaymentRecorded, PaymentRepo},
            promo_codes::PromoCodeUseCases,
            subscriptions::{ProfileRepo, SubscriptionUseCases},
        },
    },
    domain::entities::subscription::PlanType,
};

// ============================================================================
// Webhook payload
// ============================================================================

/// Raw gateway notification body. Only the payment id is trusted from it;
/// everything else is re-fetched from the gateway before any write.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayWebhookEvent {
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    pub event: Option<String>,
    pub object: Option<GatewayWebhookObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayWebhookObject {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

const EVENT_PAYMENT_SUCCEEDED: &str = "payment.succeeded";

/// What the reconciler decided about one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Not a payment.succeeded notification, or the gateway did not confirm
    /// the payment. Acknowledged without any write.
    Ignored,
    /// First confirmed delivery: ledger updated.
    Processed,
    /// Duplicate delivery of an already-recorded payment.
    AlreadyProcessed,
}

// ============================================================================
// Reconciler
// ============================================================================

pub struct WebhookReconciler {
    gateway: Arc<dyn PaymentGatewayPort>,
    payments: Arc<dyn PaymentRepo>,
    subscriptions: Arc<SubscriptionUseCases>,
    promo_codes: Arc<PromoCodeUseCases>,
    profiles: Arc<dyn ProfileRepo>,
    notifier: Arc<dyn SubscriptionNotifier>,
}

impl WebhookReconciler {
    pub fn new(
        gateway: Arc<dyn PaymentGatewayPort>,
        payments: Arc<dyn PaymentRepo>,
        subscriptions: Arc<SubscriptionUseCases>,
        promo_codes: Arc<PromoCodeUseCases>,
        profiles: Arc<dyn ProfileRepo>,
        notifier: Arc<dyn SubscriptionNotifier>,
    ) -> Self {
        Self {
            gateway,
            payments,
            subscriptions,
            promo_codes,
            profiles,
            notifier,
        }
    }

    /// Process one webhook delivery.
    ///
    /// The flow is: filter by event type, re-verify the payment against the
    /// gateway (the webhook body is untrusted input on an open endpoint),
    /// record the success idempotently keyed on the gateway payment id, then
    /// apply the ledger transition. Infrastructure errors propagate so the
    /// gateway retries the delivery; everything after the idempotent record
    /// is written at most once across retries.
    pub async fn handle(&self, event: &GatewayWebhookEvent) -> AppResult<ReconcileOutcome> {
        if event.event.as_deref() != Some(EVENT_PAYMENT_SUCCEEDED) {
            tracing::debug!(event = ?event.event, "Ignoring non-success webhook event");
            return Ok(ReconcileOutcome::Ignored);
        }

        let Some(object) = &event.object else {
            return Err(AppError::InvalidInput(
                "Webhook payload missing payment object".into(),
            ));
        };
        if object.id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Webhook payload missing payment id".into(),
            ));
        }

        // Re-verify with the gateway. A transport or gateway error here must
        // surface as a retryable failure, not as a silent ack.
        let intent = self.gateway.get_payment(&object.id).await?;

        if intent.status != PaymentIntentStatus::Succeeded || !intent.paid {
            tracing::warn!(
                gateway_payment_id = %object.id,
                status = intent.status.as_str(),
                paid = intent.paid,
                "Webhook claimed success but gateway disagrees"
            );
            return Ok(ReconcileOutcome::Ignored);
        }

        let (user_id, plan_type) = parse_metadata(&intent)?;
        if plan_type != PlanType::Pro {
            return Err(AppError::InvalidInput(format!(
                "Unexpected plan type in payment metadata: {}",
                plan_type.as_str()
            )));
        }

        let amount = intent.amount.parse::<f64>().map_err(|_| {
            AppError::Internal(format!("Unparseable gateway amount: {}", intent.amount))
        })?;
        let promo_code = intent.metadata.get("promo_code").cloned();

        match self
            .payments
            .mark_succeeded(&intent.id, user_id, amount, promo_code.as_deref())
            .await?
        {
            PaymentRecorded::AlreadyRecorded => {
                tracing::info!(gateway_payment_id = %intent.id, "Duplicate webhook delivery, already recorded");
                return Ok(ReconcileOutcome::AlreadyProcessed);
            }
            PaymentRecorded::Recorded => {}
        }

        // Redemption counting is best-effort: the payment already went
        // through at the discounted price.
        if let Some(code) = &promo_code {
            self.promo_codes.apply(code).await;
        }

        let paid_at = intent.created_at.unwrap_or_else(chrono::Utc::now);
        if let Err(error) = self
            .subscriptions
            .activate_from_payment(user_id, &intent.id, paid_at)
            .await
        {
            tracing::error!(%error, gateway_payment_id = %intent.id, %user_id, "Ledger activation failed");
            // Re-open the idempotency gate so the gateway's retry attempts
            // the activation again.
            if let Err(mark_error) = self.payments.mark_failed(&intent.id).await {
                tracing::error!(%mark_error, gateway_payment_id = %intent.id, "Failed to mark payment failed");
            }
            return Err(error);
        }

        self.send_activation_email(user_id, amount).await;

        tracing::info!(gateway_payment_id = %intent.id, %user_id, amount, "Payment reconciled");
        Ok(ReconcileOutcome::Processed)
    }

    async fn send_activation_email(&self, user_id: Uuid, amount: f64) {
        match self.profiles.get_by_id(user_id).await {
            Ok(Some(profile)) => {
                if let Err(error) = self
                    .notifier
                    .subscription_activated(&profile.email, amount)
                    .await
                {
                    tracing::warn!(%error, %user_id, "Activation email failed");
                }
            }
            Ok(None) => {
                tracing::warn!(%user_id, "No profile for activation email");
            }
            Err(error) => {
                tracing::warn!(%error, %user_id, "Profile lookup for activation email failed");
            }
        }
    }
}

/// Pull the identifying metadata off a re-verified intent. The metadata was
/// set by us at creation time, but a payment created outside this service
/// would be missing it, so absence is a hard reject.
fn parse_metadata(intent: &PaymentIntent) -> AppResult<(Uuid, PlanType)> {
    let user_id = intent
        .metadata
        .get("user_id")
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            AppError::InvalidInput("Payment metadata missing valid user_id".into())
        })?;

    let plan_type = intent
        .metadata
        .get("plan_type")
        .and_then(|v| PlanType::parse(v))
        .ok_or_else(|| {
            AppError::InvalidInput("Payment metadata missing valid plan_type".into())
        })?;

    Ok((user_id, plan_type))
}
