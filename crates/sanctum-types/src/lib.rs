//! # Sanctum Types
//!
//! Core types, models, and error definitions for Sanctum.
//!
//! This crate provides the foundational type system for the layer:
//!
//! - **`error`** - The typed error taxonomy every failure is reduced to
//! - **`models`** - Domain models (events, envelopes, configuration, stats)
//!
//! ## Architecture Role
//!
//! `sanctum-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!         sanctum-types (this crate)
//!                 │
//!                 ▼
//!           sanctum-core
//!           (gateway, bridge)
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for API calls and persistence
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{BridgeError, ErrorCode, Result, TypedError, GENERIC_ERROR_MESSAGE};

// Re-export core model types
pub use models::{
    ActorStatus, AlertSeverity, BridgeConfig, BridgeStats, ErrorBody, ErrorEnvelope, EventFilter,
    EventPayload, FunctionEnvelope, GatewayConfig, Recipient, RetryConfig, SaintEvent,
};
