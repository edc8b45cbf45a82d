pub mod app;
pub mod config;
pub mod db;
pub mod http_client;
pub mod setup;
pub mod yookassa_client;
pub mod yookassa_payment_adapter;
