//! # Sanctum Core
//!
//! Client-side resilience and coordination for Sanctum.
//!
//! ## Architecture
//!
//! ```text
//! sanctum-core/src/
//! ├── gateway/          # Resilient request gateway
//! │   ├── auth.rs       #   Bearer credential seam
//! │   ├── classify.rs   #   Raw failure -> typed taxonomy
//! │   ├── retry.rs      #   Backoff + transient/permanent split
//! │   └── dedup.rs      #   Keyed single-flight registry
//! ├── bridge/           # Addressed pub/sub with persisted log
//! │   ├── store.rs      #   Bounded event log stores
//! │   └── status.rs     #   Activity projections
//! └── logging.rs        # Mode-gated tracing setup
//! ```
//!
//! The gateway wraps every outbound call in auth injection, per-attempt
//! deadlines, failure classification, and bounded retry. The bridge carries
//! addressed events between modules, mirrors traffic to the monitor actor,
//! and retains a bounded audit log across restarts.

// Test-only lints: allow panic!, unwrap, etc. in test code
#![cfg_attr(
    test,
    allow(clippy::panic, clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)
)]

pub mod bridge;
pub mod gateway;
pub mod logging;

// Re-export commonly used types
pub use bridge::store::{EventStore, JsonFileEventStore, MemoryEventStore};
pub use bridge::{EventBridge, SubscriptionId};
pub use gateway::auth::{AnonymousTokens, StaticTokenProvider, TokenProvider};
pub use gateway::dedup::DedupRegistry;
pub use gateway::{Gateway, Outcome};
pub use logging::RuntimeMode;
