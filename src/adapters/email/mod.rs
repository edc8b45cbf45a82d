pub mod resend;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{app_error::AppResult, application::ports::notifications::SubscriptionNotifier};

/// Notifier used when no email provider is configured. Logs instead of
/// sending so local setups work without credentials.
pub struct LoggingNotifier;

#[async_trait]
impl SubscriptionNotifier for LoggingNotifier {
    async fn trial_started(&self, email: &str, trial_end: DateTime<Utc>) -> AppResult<()> {
        tracing::info!(%email, %trial_end, "Email disabled, skipping trial started notice");
        Ok(())
    }

    async fn subscription_activated(&self, email: &str, amount: f64) -> AppResult<()> {
        tracing::info!(%email, amount, "Email disabled, skipping activation notice");
        Ok(())
    }

    async fn subscription_canceled(
        &self,
        email: &str,
        end_date: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        tracing::info!(%email, ?end_date, "Email disabled, skipping cancellation notice");
        Ok(())
    }
}
