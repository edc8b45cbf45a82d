pub mod app_error;
pub mod entitlement;
pub mod ports;
pub mod use_cases;
