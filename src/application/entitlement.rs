//! Read-side entitlement resolution.
//!
//! Everything here is a pure function of the stored subscription row and
//! wall-clock time: no writes, no network. Expiry is derived at read time,
//! so an `active` row whose `end_date` has passed resolves to free tier
//! without any sweep having touched it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::subscription::{PlanType, Subscription, SubscriptionStatus};

/// Feature limits for one plan. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanLimits {
    pub max_pets: Option<u32>,
    pub max_health_records_per_month: Option<u32>,
    pub advanced_analytics: bool,
    pub telegram_notifications: bool,
    pub photo_upload: bool,
    pub priority_support: bool,
}

impl PlanLimits {
    pub fn for_plan(plan: PlanType) -> Self {
        match plan {
            PlanType::Free => PlanLimits {
                max_pets: Some(2),
                max_health_records_per_month: Some(5),
                advanced_analytics: false,
                telegram_notifications: false,
                photo_upload: true,
                priority_support: false,
            },
            PlanType::Pro => PlanLimits {
                max_pets: None,
                max_health_records_per_month: None,
                advanced_analytics: true,
                telegram_notifications: true,
                photo_upload: true,
                priority_support: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Entitlement {
    pub is_pro: bool,
    pub is_trial_active: bool,
    pub limits: PlanLimits,
}

impl Entitlement {
    fn free() -> Self {
        Entitlement {
            is_pro: false,
            is_trial_active: false,
            limits: PlanLimits::for_plan(PlanType::Free),
        }
    }
}

/// Derive the user-facing entitlement from the latest subscription row.
///
/// No row means free tier. A trial counts while `trial_end_date` lies in the
/// future; a paid subscription counts while `status` is `active` and
/// `end_date` (if set) lies in the future. Canceled rows keep granting PRO
/// until their paid-through `end_date` passes.
pub fn resolve(subscription: Option<&Subscription>, now: DateTime<Utc>) -> Entitlement {
    let Some(sub) = subscription else {
        return Entitlement::free();
    };

    let is_trial_active = sub.status == SubscriptionStatus::Trial
        && sub.trial_end_date.is_some_and(|end| end > now);

    // Cancellation is end-of-period: a canceled row keeps granting access
    // until the paid-through `end_date`, it only stops renewal. A canceled
    // row without an `end_date` has nothing paid through and grants nothing.
    let has_paid_access = match sub.status {
        SubscriptionStatus::Active => sub.end_date.is_none_or(|end| end > now),
        SubscriptionStatus::Canceled => sub.end_date.is_some_and(|end| end > now),
        SubscriptionStatus::Trial | SubscriptionStatus::Expired => false,
    };

    let is_pro = sub.plan_type == PlanType::Pro && (has_paid_access || is_trial_active);

    let effective_plan = if is_pro { PlanType::Pro } else { PlanType::Free };

    Entitlement {
        is_pro,
        is_trial_active,
        limits: PlanLimits::for_plan(effective_plan),
    }
}

/// The plan the profile projection should mirror right now.
pub fn effective_plan(subscription: Option<&Subscription>, now: DateTime<Utc>) -> PlanType {
    if resolve(subscription, now).is_pro {
        PlanType::Pro
    } else {
        PlanType::Free
    }
}
