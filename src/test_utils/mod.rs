//! Test utilities shared by unit and HTTP-level tests.
//!
//! This module provides:
//! - Test data factories for creating valid fixtures
//! - In-memory repository, email and rate limiter implementations
//! - A builder that wires an `AppState` from those doubles

mod app_state_builder;
mod factories;
mod mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use mocks::*;
