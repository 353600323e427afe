//! Core domain models for Sanctum.
//!
//! This module contains all shared data structures used across the layer.

mod config;
mod envelope;
mod event;
mod stats;

// Re-export all models
pub use config::{BridgeConfig, GatewayConfig, RetryConfig};
pub use envelope::{ErrorBody, ErrorEnvelope, FunctionEnvelope};
pub use event::{
    AlertSeverity, EventFilter, EventPayload, Recipient, SaintEvent, BROADCAST_ADDR,
    DEFAULT_MONITOR, MAX_LOG_SIZE,
};
pub use stats::{ActorStatus, BridgeStats};
