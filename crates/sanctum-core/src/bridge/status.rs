//! Activity projections over the bridge.

use super::EventBridge;
use sanctum_types::models::{BridgeStats, BROADCAST_ADDR};
use sanctum_types::BridgeError;

impl EventBridge {
    /// Actors with at least one live subscription. Broadcast listeners are
    /// observers, not actors, so the broadcast key is excluded.
    pub fn active_agents(&self) -> usize {
        self.subscribers
            .read()
            .map(|subscribers| {
                subscribers.keys().filter(|key| key.as_str() != BROADCAST_ADDR).count()
            })
            .unwrap_or(0)
    }

    /// Total registered handlers across all keys.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .map(|subscribers| subscribers.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Per-actor activity snapshot projected from the retained log plus the
    /// live subscriber registry.
    pub async fn get_statuses(&self) -> Result<BridgeStats, BridgeError> {
        let events = self.store.read_all().await?;
        Ok(BridgeStats::from_log(&events, self.active_agents()))
    }
}
