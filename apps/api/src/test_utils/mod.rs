//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures and raw webhook payloads
//! - Document store wrappers that count writes, fail on demand, or interleave callers
//! - A scripted payment gateway that records calls
//! - `TestAppStateBuilder` for HTTP tests

mod app_state_builder;
mod factories;
mod gateway_mocks;
mod store_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use gateway_mocks::*;
pub use store_mocks::*;
