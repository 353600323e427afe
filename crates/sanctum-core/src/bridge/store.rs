//! Bounded, durable storage for the event log.
//!
//! A store retains at most `capacity` events in emission order; appending
//! past the cap evicts the oldest entries first.

use async_trait::async_trait;
use sanctum_types::models::{SaintEvent, MAX_LOG_SIZE};
use sanctum_types::BridgeError;
use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

/// Bounded, ordered event log.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one event, evicting oldest entries past capacity.
    async fn append(&self, event: &SaintEvent) -> Result<(), BridgeError>;

    /// All retained events, oldest first.
    async fn read_all(&self) -> Result<Vec<SaintEvent>, BridgeError>;

    /// Maximum number of retained events.
    fn capacity(&self) -> usize;

    /// Drop every retained event.
    async fn clear(&self) -> Result<(), BridgeError>;
}

/// In-memory store for tests and ephemeral sessions.
pub struct MemoryEventStore {
    events: RwLock<VecDeque<SaintEvent>>,
    capacity: usize,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOG_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { events: RwLock::new(VecDeque::with_capacity(capacity)), capacity }
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, event: &SaintEvent) -> Result<(), BridgeError> {
        let mut events = self.events.write().await;
        events.push_back(event.clone());
        if events.len() > self.capacity {
            let excess = events.len() - self.capacity;
            events.drain(..excess);
        }
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<SaintEvent>, BridgeError> {
        Ok(self.events.read().await.iter().cloned().collect())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn clear(&self) -> Result<(), BridgeError> {
        self.events.write().await.clear();
        Ok(())
    }
}

/// Store persisting the log as a single JSON document on disk.
///
/// Appends are read-modify-write cycles serialized through an internal
/// mutex and written atomically (temp file + rename), so a crash leaves
/// either the old or the new document, never a torn one. The lock does not
/// extend across processes; the log is meant to be owned by one process.
pub struct JsonFileEventStore {
    path: PathBuf,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl JsonFileEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, MAX_LOG_SIZE)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self { path: path.into(), capacity, write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted log. A missing file is an empty log; an
    /// unreadable document is treated as empty so one bad write cannot
    /// wedge the bridge forever.
    async fn load(&self) -> Result<Vec<SaintEvent>, BridgeError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(BridgeError::Storage(format!(
                    "failed to read event log {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&content) {
            Ok(events) => Ok(events),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Event log unreadable, starting empty");
                Ok(Vec::new())
            }
        }
    }

    async fn persist(&self, events: &[SaintEvent]) -> Result<(), BridgeError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                BridgeError::Storage(format!(
                    "failed to create log directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(events)?;
        let temp_path = self.path.with_extension("json.tmp");

        tokio::fs::write(&temp_path, &json)
            .await
            .map_err(|e| BridgeError::Storage(format!("failed to write temp file: {}", e)))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| BridgeError::Storage(format!("failed to rename log file: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl EventStore for JsonFileEventStore {
    async fn append(&self, event: &SaintEvent) -> Result<(), BridgeError> {
        let _guard = self.write_lock.lock().await;

        let mut events = self.load().await?;
        events.push(event.clone());
        if events.len() > self.capacity {
            let excess = events.len() - self.capacity;
            events.drain(..excess);
        }
        self.persist(&events).await
    }

    async fn read_all(&self) -> Result<Vec<SaintEvent>, BridgeError> {
        // Rename is atomic on the same filesystem, so an unlocked read sees
        // either the old or the new document.
        self.load().await
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn clear(&self) -> Result<(), BridgeError> {
        let _guard = self.write_lock.lock().await;
        self.persist(&[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanctum_types::models::{EventPayload, Recipient};

    fn ping(from: &str) -> SaintEvent {
        SaintEvent::new(from, Recipient::All, EventPayload::StatusPing)
    }

    #[tokio::test]
    async fn test_memory_store_rotates_oldest_first() {
        let store = MemoryEventStore::with_capacity(100);
        for i in 0..150 {
            store.append(&ping(&format!("actor-{i}"))).await.unwrap();
        }

        let events = store.read_all().await.unwrap();
        assert_eq!(events.len(), 100);
        // The 50 oldest entries are gone.
        assert_eq!(events[0].from, "actor-50");
        assert_eq!(events[99].from, "actor-149");
    }

    #[tokio::test]
    async fn test_memory_store_preserves_order() {
        let store = MemoryEventStore::new();
        for name in ["joseph", "raphael", "michael"] {
            store.append(&ping(name)).await.unwrap();
        }

        let from: Vec<_> = store.read_all().await.unwrap().into_iter().map(|e| e.from).collect();
        assert_eq!(from, vec!["joseph", "raphael", "michael"]);
    }

    #[tokio::test]
    async fn test_memory_store_clear() {
        let store = MemoryEventStore::new();
        store.append(&ping("joseph")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.read_all().await.unwrap().is_empty());
    }
}
