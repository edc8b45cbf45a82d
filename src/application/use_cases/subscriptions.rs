use async_trait::async_trait;
use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        entitlement::{self, Entitlement},
        ports::notifications::SubscriptionNotifier,
    },
    domain::entities::{
        profile::Profile,
        subscription::{PlanType, Subscription, SubscriptionStatus},
    },
};

// ============================================================================
// Repo Traits
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub gateway_payment_id: Option<String>,
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn create(&self, input: &NewSubscription) -> AppResult<Subscription>;

    /// Latest row by `created_at` for the user, the authoritative one.
    async fn latest_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>>;

    /// Whether the user has ever had any subscription row, including
    /// expired and canceled ones. Guards one-trial-per-user.
    async fn exists_for_user(&self, user_id: Uuid) -> AppResult<bool>;

    /// Conditional trial -> active flip: updates only if the user's latest
    /// row is still in `trial` status. Stamps the payment reference and the
    /// paid-through date. Returns the updated row, or None if no trial row
    /// matched.
    async fn activate_trial(
        &self,
        user_id: Uuid,
        gateway_payment_id: &str,
        end_date: DateTime<Utc>,
    ) -> AppResult<Option<Subscription>>;

    /// Mark a row canceled. `end_date` is left untouched: cancellation stops
    /// renewal, not the already-paid period. Returns the updated row.
    async fn cancel(&self, id: Uuid) -> AppResult<Option<Subscription>>;
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<Profile>>;

    async fn set_subscription_type(&self, user_id: Uuid, plan: PlanType) -> AppResult<()>;
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    pub plan_type: PlanType,
    pub status: Option<SubscriptionStatus>,
    pub is_pro: bool,
    pub is_trial_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub trial_end_date: Option<DateTime<Utc>>,
}

// ============================================================================
// Use Cases
// ============================================================================

pub struct SubscriptionUseCases {
    subscriptions: Arc<dyn SubscriptionRepo>,
    profiles: Arc<dyn ProfileRepo>,
    notifier: Arc<dyn SubscriptionNotifier>,
    trial_days: i64,
}

impl SubscriptionUseCases {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepo>,
        profiles: Arc<dyn ProfileRepo>,
        notifier: Arc<dyn SubscriptionNotifier>,
        trial_days: i64,
    ) -> Self {
        Self {
            subscriptions,
            profiles,
            notifier,
            trial_days,
        }
    }

    /// Start a free trial. One trial per user, ever: any prior row, whatever
    /// its status, makes this fail.
    pub async fn start_trial(&self, user_id: Uuid) -> AppResult<Subscription> {
        let profile = self
            .profiles
            .get_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if self.subscriptions.exists_for_user(user_id).await? {
            return Err(AppError::InvalidInput(
                "User has already had a subscription".into(),
            ));
        }

        let now = Utc::now();
        let trial_end = now + Duration::days(self.trial_days);
        let subscription = self
            .subscriptions
            .create(&NewSubscription {
                user_id,
                plan_type: PlanType::Pro,
                status: SubscriptionStatus::Trial,
                start_date: now,
                end_date: None,
                trial_end_date: Some(trial_end),
                gateway_payment_id: None,
            })
            .await?;

        self.project_profile(user_id).await?;

        if let Err(error) = self.notifier.trial_started(&profile.email, trial_end).await {
            tracing::warn!(%error, %user_id, "Trial started email failed");
        }

        tracing::info!(%user_id, %trial_end, "Trial started");
        Ok(subscription)
    }

    /// Resolved entitlement plus the raw ledger dates for display.
    pub async fn status(&self, user_id: Uuid) -> AppResult<SubscriptionView> {
        let subscription = self.subscriptions.latest_by_user(user_id).await?;
        let now = Utc::now();
        let ent = entitlement::resolve(subscription.as_ref(), now);

        Ok(SubscriptionView {
            plan_type: if ent.is_pro {
                PlanType::Pro
            } else {
                PlanType::Free
            },
            status: subscription.as_ref().map(|s| s.status),
            is_pro: ent.is_pro,
            is_trial_active: ent.is_trial_active,
            start_date: subscription.as_ref().map(|s| s.start_date),
            end_date: subscription.as_ref().and_then(|s| s.end_date),
            trial_end_date: subscription.as_ref().and_then(|s| s.trial_end_date),
        })
    }

    pub async fn limits(&self, user_id: Uuid) -> AppResult<Entitlement> {
        let subscription = self.subscriptions.latest_by_user(user_id).await?;
        Ok(entitlement::resolve(subscription.as_ref(), Utc::now()))
    }

    /// Cancel a subscription. Access continues until the paid-through
    /// `end_date`; only renewal stops.
    pub async fn cancel(&self, subscription_id: Uuid) -> AppResult<Subscription> {
        let canceled = self
            .subscriptions
            .cancel(subscription_id)
            .await?
            .ok_or(AppError::NotFound)?;

        self.project_profile(canceled.user_id).await?;

        match self.profiles.get_by_id(canceled.user_id).await {
            Ok(Some(profile)) => {
                if let Err(error) = self
                    .notifier
                    .subscription_canceled(&profile.email, canceled.end_date)
                    .await
                {
                    tracing::warn!(%error, user_id = %canceled.user_id, "Cancellation email failed");
                }
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(%error, user_id = %canceled.user_id, "Profile lookup for cancellation email failed");
            }
        }

        tracing::info!(%subscription_id, user_id = %canceled.user_id, "Subscription canceled");
        Ok(canceled)
    }

    /// Apply a confirmed payment to the ledger. If the user's latest row is
    /// still a trial it flips to active in place; otherwise a fresh active
    /// row is appended. Either way the paid-through date is one calendar
    /// month from the confirmation time.
    pub async fn activate_from_payment(
        &self,
        user_id: Uuid,
        gateway_payment_id: &str,
        paid_at: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        let end_date = paid_at
            .checked_add_months(Months::new(1))
            .unwrap_or_else(|| paid_at + Duration::days(30));

        let subscription = match self
            .subscriptions
            .activate_trial(user_id, gateway_payment_id, end_date)
            .await?
        {
            Some(updated) => {
                tracing::info!(%user_id, gateway_payment_id, "Trial converted to active");
                updated
            }
            None => {
                let created = self
                    .subscriptions
                    .create(&NewSubscription {
                        user_id,
                        plan_type: PlanType::Pro,
                        status: SubscriptionStatus::Active,
                        start_date: paid_at,
                        end_date: Some(end_date),
                        trial_end_date: None,
                        gateway_payment_id: Some(gateway_payment_id.to_string()),
                    })
                    .await?;
                tracing::info!(%user_id, gateway_payment_id, "Active subscription created");
                created
            }
        };

        self.project_profile(user_id).await?;
        Ok(subscription)
    }

    /// Re-derive the profile's `subscription_type` from the ledger.
    pub async fn project_profile(&self, user_id: Uuid) -> AppResult<PlanType> {
        let subscription = self.subscriptions.latest_by_user(user_id).await?;
        let plan = entitlement::effective_plan(subscription.as_ref(), Utc::now());
        self.profiles.set_subscription_type(user_id, plan).await?;
        Ok(plan)
    }
}
