use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::app_error::AppResult;

/// Transactional email side channel. Every call site treats failures as
/// log-and-continue; a missed email never blocks a ledger transition.
#[async_trait]
pub trait SubscriptionNotifier: Send + Sync {
    async fn trial_started(&self, email: &str, trial_end: DateTime<Utc>) -> AppResult<()>;

    async fn subscription_activated(&self, email: &str, amount: f64) -> AppResult<()>;

    async fn subscription_canceled(
        &self,
        email: &str,
        end_date: Option<DateTime<Utc>>,
    ) -> AppResult<()>;
}
