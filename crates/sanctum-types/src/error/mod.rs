//! Typed error definitions for Sanctum.
//!
//! This module provides the structured error taxonomy every failure in the
//! layer is reduced to. All errors are designed to be:
//!
//! - **Serializable** for API responses and persistence via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants
//! - **Composable** via thiserror derive macros

mod bridge;
mod gateway;

pub use bridge::BridgeError;
pub use gateway::{ErrorCode, TypedError, GENERIC_ERROR_MESSAGE};

/// Standard Result type using TypedError.
pub type Result<T> = std::result::Result<T, TypedError>;
