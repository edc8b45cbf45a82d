pub mod checkout_session;
pub mod payment;
pub mod profile;
pub mod promo_code;
pub mod subscription;
