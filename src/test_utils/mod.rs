//! Shared fixtures for unit and route tests: entity factories with closure
//! overrides and in-memory implementations of every repo and port.

pub mod app_state_builder;
pub mod mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use mocks::*;
