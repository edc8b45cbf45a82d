use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Short-lived server-held record bridging payment creation and the success
/// page. The token travels in the gateway `return_url`, so the success page
/// never depends on client-side storage surviving the redirect.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub gateway_payment_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
}
