pub mod payments;
pub mod promo_codes;
pub mod subscriptions;
pub mod webhook_reconciler;
