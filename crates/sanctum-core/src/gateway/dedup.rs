//! Keyed single-flight deduplication for in-flight operations.
//!
//! Concurrent calls that share a key are collapsed onto one underlying
//! operation and all receive its outcome, success or failure alike. Each
//! operation is driven by a detached task, so it runs to completion even
//! when every caller is dropped mid-flight. The registry entry is removed
//! the moment the outcome settles, so the next call with the same key
//! starts a fresh operation.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// One registered in-flight operation.
///
/// The sequence number is compared at cleanup time so a caller finishing
/// late cannot evict an unrelated successor registered under the same key.
struct PendingOperation<T> {
    seq: u64,
    outcome: Shared<BoxFuture<'static, T>>,
}

/// Registry of keyed in-flight operations.
pub struct DedupRegistry<T: Clone> {
    pending: Arc<DashMap<String, PendingOperation<T>>>,
    seq: AtomicU64,
}

impl<T> DedupRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { pending: Arc::new(DashMap::new()), seq: AtomicU64::new(0) }
    }

    /// Run `operation` under `key`, or join the operation already in flight
    /// there. Every caller receives a clone of the same outcome. The
    /// operation itself runs on a detached task and is never cancelled by
    /// callers going away.
    pub async fn run<F>(&self, key: &str, operation: F) -> T
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (seq, outcome) = match self.pending.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                let pending = entry.get();
                debug!(key, "Joining in-flight operation");
                (pending.seq, pending.outcome.clone())
            }
            Entry::Vacant(slot) => {
                let seq = self.seq.fetch_add(1, Ordering::Relaxed);
                let outcome = operation.boxed().shared();
                slot.insert(PendingOperation { seq, outcome: outcome.clone() });

                // Detached driver: polls the operation to completion and
                // frees the key even if every caller is dropped mid-flight.
                let pending = Arc::clone(&self.pending);
                let owned_key = key.to_string();
                let driven = outcome.clone();
                tokio::spawn(async move {
                    driven.await;
                    pending.remove_if(&owned_key, |_, pending| pending.seq == seq);
                });

                (seq, outcome)
            }
        };

        let result = outcome.await;

        // Awaiters also attempt cleanup; the seq guard makes it idempotent.
        self.pending.remove_if(key, |_, pending| pending.seq == seq);
        result
    }

    /// Number of operations currently registered.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl<T> Default for DedupRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a stable, bounded dedup key from an operation name and its
/// salient arguments.
pub fn fingerprint_key(operation: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        // NUL separator keeps adjacent parts distinct
        hasher.update([0u8]);
    }
    let digest = format!("{:x}", hasher.finalize());
    format!("{}-{}", operation, &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_op(
        counter: Arc<AtomicUsize>,
    ) -> impl Future<Output = Result<String, String>> + Send + 'static {
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("done".to_string())
        }
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_execution() {
        let registry = DedupRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            registry.run("chat-1", counting_op(counter.clone())),
            registry.run("chat-1", counting_op(counter.clone())),
        );

        assert_eq!(a, Ok("done".to_string()));
        assert_eq!(a, b);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let registry = DedupRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            registry.run("chat-1", counting_op(counter.clone())),
            registry.run("chat-2", counting_op(counter.clone())),
        );

        assert_eq!(a, b);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(registry.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_settled_key_starts_fresh() {
        let registry = DedupRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let first = registry.run("op", counting_op(counter.clone())).await;
        let second = registry.run("op", counting_op(counter.clone())).await;

        assert_eq!(first, second);
        assert_eq!(counter.load(Ordering::SeqCst), 2, "second call must re-execute");
        assert_eq!(registry.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_caller_does_not_leak_the_key() {
        let registry: Arc<DedupRegistry<Result<String, String>>> = Arc::new(DedupRegistry::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let caller = tokio::spawn({
            let registry = Arc::clone(&registry);
            let operation = counting_op(counter.clone());
            async move { registry.run("solo", operation).await }
        });

        // Let the caller register, then drop it mid-flight.
        tokio::time::sleep(Duration::from_millis(10)).await;
        caller.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1, "operation must run to completion");
        assert_eq!(registry.in_flight(), 0, "abandoned key must be freed");
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_cleaned_up() {
        let registry: DedupRegistry<Result<String, String>> = DedupRegistry::new();

        let failing = |msg: &'static str| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err::<String, String>(msg.to_string())
        };

        let (a, b) = tokio::join!(
            registry.run("boom", failing("first")),
            registry.run("boom", failing("second")),
        );

        // Both callers see the leader's failure.
        assert_eq!(a, Err("first".to_string()));
        assert_eq!(a, b);
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn test_fingerprint_key_shape() {
        let key = fingerprint_key("chat", &["user-7", "hello world"]);
        assert!(key.starts_with("chat-"));
        assert_eq!(key.len(), "chat-".len() + 16);

        // Stable across calls.
        assert_eq!(key, fingerprint_key("chat", &["user-7", "hello world"]));
    }

    #[test]
    fn test_fingerprint_key_separates_parts() {
        assert_ne!(fingerprint_key("op", &["ab", "c"]), fingerprint_key("op", &["a", "bc"]));
        assert_ne!(fingerprint_key("op", &["x"]), fingerprint_key("op", &["y"]));
    }
}
