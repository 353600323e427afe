//! Addressed publish/subscribe between modules.
//!
//! Events are addressed to a single actor or to the broadcast address;
//! broadcast listeners observe all traffic, and the monitor actor receives
//! a mirrored copy of every event it is not already a party to. Every
//! emission is journaled to a bounded persisted log before delivery.

pub mod status;
pub mod store;

use crate::bridge::store::{EventStore, JsonFileEventStore, MemoryEventStore};
use sanctum_types::models::{
    BridgeConfig, EventFilter, EventPayload, Recipient, SaintEvent, BROADCAST_ADDR,
};
use sanctum_types::BridgeError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};
use tracing::{debug, error, warn};

/// Callback invoked for each delivered event. Failures are logged and
/// isolated; they never affect other subscribers or the emitter.
pub type EventHandler = Arc<dyn Fn(&SaintEvent) -> anyhow::Result<()> + Send + Sync>;

struct SubscriberEntry {
    id: u64,
    handler: EventHandler,
}

/// Identifies one registered subscription; pass back to
/// [`EventBridge::unsubscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionId {
    actor: String,
    id: u64,
}

/// The addressed event bus.
pub struct EventBridge {
    subscribers: RwLock<HashMap<String, Vec<SubscriberEntry>>>,
    store: Arc<dyn EventStore>,
    monitor: String,
    next_id: AtomicU64,
}

impl EventBridge {
    /// Build a bridge over an injected store with the default monitor.
    /// Retention is whatever the store itself enforces.
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::build(store, &BridgeConfig::default())
    }

    /// In-memory bridge sized and named from the configuration.
    pub fn in_memory(config: &BridgeConfig) -> Self {
        Self::build(Arc::new(MemoryEventStore::with_capacity(config.log_capacity)), config)
    }

    /// File-backed bridge at `path`, sized and named from the
    /// configuration.
    pub fn persistent(path: impl Into<PathBuf>, config: &BridgeConfig) -> Self {
        Self::build(Arc::new(JsonFileEventStore::with_capacity(path, config.log_capacity)), config)
    }

    fn build(store: Arc<dyn EventStore>, config: &BridgeConfig) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            store,
            monitor: config.monitor.clone(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Process-wide bridge backed by a JSON file in the local data
    /// directory.
    pub fn global() -> &'static EventBridge {
        static INSTANCE: OnceLock<EventBridge> = OnceLock::new();
        INSTANCE
            .get_or_init(|| EventBridge::persistent(default_log_path(), &BridgeConfig::default()))
    }

    /// The configured monitor actor.
    pub fn monitor(&self) -> &str {
        &self.monitor
    }

    /// Register `handler` under `actor_id`.
    ///
    /// Subscribing to the broadcast address observes every event on the
    /// bridge. Handlers registered under one key are invoked in
    /// subscription order.
    pub fn subscribe<F>(&self, actor_id: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&SaintEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let actor = actor_id.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut subscribers) = self.subscribers.write() {
            subscribers
                .entry(actor.clone())
                .or_default()
                .push(SubscriberEntry { id, handler: Arc::new(handler) });
            debug!(actor = %actor, id, "Subscriber registered");
        } else {
            error!(actor = %actor, "Subscriber registry lock poisoned, registration dropped");
        }

        SubscriptionId { actor, id }
    }

    /// Remove a subscription. Returns `false` when it was already gone.
    pub fn unsubscribe(&self, subscription: &SubscriptionId) -> bool {
        let Ok(mut subscribers) = self.subscribers.write() else {
            return false;
        };
        let Some(entries) = subscribers.get_mut(&subscription.actor) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != subscription.id);
        let removed = entries.len() < before;

        if entries.is_empty() {
            subscribers.remove(&subscription.actor);
        }
        removed
    }

    /// Emit an event: journal it, then deliver to every matching
    /// subscriber.
    ///
    /// An event that cannot be journaled is not delivered; the storage
    /// failure is returned to the emitter.
    pub async fn emit(
        &self,
        from: impl Into<String>,
        to: Recipient,
        payload: EventPayload,
    ) -> Result<SaintEvent, BridgeError> {
        let event = SaintEvent::new(from.into(), to, payload);

        if let Err(err) = self.store.append(&event).await {
            crate::critical!(
                event_type = event.event_type(),
                from = %event.from,
                error = %err,
                "Event log write failed, event dropped"
            );
            return Err(err);
        }

        self.deliver(&event);
        debug!(from = %event.from, to = %event.to, event_type = event.event_type(), "Event emitted");
        Ok(event)
    }

    /// The persisted log, oldest first, optionally filtered.
    pub async fn get_event_log(
        &self,
        filter: Option<&EventFilter>,
    ) -> Result<Vec<SaintEvent>, BridgeError> {
        let events = self.store.read_all().await?;
        Ok(match filter {
            Some(filter) => events.into_iter().filter(|event| filter.matches(event)).collect(),
            None => events,
        })
    }

    /// Drop every event from the persisted log.
    pub async fn clear_log(&self) -> Result<(), BridgeError> {
        self.store.clear().await
    }

    /// Registry keys this event is delivered to, in order. Each key is
    /// visited once, so no subscriber sees the same event twice.
    fn delivery_keys<'a>(&'a self, event: &'a SaintEvent) -> Vec<&'a str> {
        let to_key = event.to.as_str();
        let mut keys = vec![to_key];
        if to_key != BROADCAST_ADDR {
            keys.push(BROADCAST_ADDR);
        }

        // The monitor mirror applies only to traffic the monitor is not
        // already a party to, which also rules out mirror loops.
        let mirrored = event.from != self.monitor && !event.to.is_actor(&self.monitor);
        if mirrored {
            keys.push(self.monitor.as_str());
        }
        keys
    }

    fn deliver(&self, event: &SaintEvent) {
        let keys = self.delivery_keys(event);

        // Handlers are cloned out before invocation so a handler may
        // subscribe or unsubscribe without deadlocking the registry.
        let mut handlers: Vec<(&str, EventHandler)> = Vec::new();
        {
            let Ok(subscribers) = self.subscribers.read() else {
                error!("Subscriber registry lock poisoned, delivery dropped");
                return;
            };
            for key in &keys {
                if let Some(entries) = subscribers.get(*key) {
                    for entry in entries {
                        handlers.push((*key, entry.handler.clone()));
                    }
                }
            }
        }

        for (key, handler) in handlers {
            if let Err(err) = handler(event) {
                warn!(
                    subscriber = key,
                    event_type = event.event_type(),
                    error = %err,
                    "Event handler failed"
                );
            }
        }
    }
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sanctum")
        .join("event-log.json")
}
