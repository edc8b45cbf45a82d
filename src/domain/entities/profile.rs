use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::subscription::PlanType;

/// One-to-one projection of the resolved entitlement onto the user, kept for
/// cheap reads elsewhere in the app. The subscription ledger stays the source
/// of truth; on disagreement the profile gets re-projected.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub subscription_type: PlanType,
    pub updated_at: Option<DateTime<Utc>>,
}
