//! Shared infrastructure for Social Charger Club AWS Lambda functions.
//!
//! This crate provides common functionality used across all Lambda handlers:
//!
//! - [`LambdaRuntime`]: Configuration and AWS clients built once per cold start
//! - [`init_tracing`]: JSON-formatted tracing for CloudWatch Logs
//! - [`ApiError`]: Status code and `{"error": ...}` body for failed requests
//! - [`Responder`]: API Gateway proxy responses with CORS headers
//! - Request types with validation for each Lambda endpoint
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides event builders and response helpers for
//! Lambda handler testing. Enable the `test-utils` feature to access it from
//! dependent crates.

#![deny(warnings)]

mod problem;
mod requests;
mod response;
mod runtime;
mod tracing_init;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use problem::{ApiError, INTERNAL_ERROR_MESSAGE, METHOD_NOT_ALLOWED_MESSAGE};
pub use requests::{parse_body, RegisterChargingPointsRequest, SearchRequest, Validate};
pub use response::Responder;
pub use runtime::{InitError, LambdaRuntime};
pub use tracing_init::init_tracing;
