//! Activity projections derived from the persisted event log.

use super::event::SaintEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-actor activity summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorStatus {
    pub actor_id: String,
    /// Timestamp of the actor's most recent emission
    pub last_seen: DateTime<Utc>,
    /// Emissions still present in the retained log
    pub events_emitted: usize,
}

/// Bridge-wide activity snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeStats {
    /// Per-actor summaries, sorted by actor id
    pub actors: Vec<ActorStatus>,
    /// Actors with at least one live subscription (broadcast listeners excluded)
    pub active_agents: usize,
    /// Events currently retained in the log
    pub logged_events: usize,
}

impl BridgeStats {
    /// Project a snapshot from the retained log and the live subscriber count.
    pub fn from_log(events: &[SaintEvent], active_agents: usize) -> Self {
        let mut by_actor: HashMap<&str, ActorStatus> = HashMap::new();

        for event in events {
            by_actor
                .entry(event.from.as_str())
                .and_modify(|status| {
                    status.events_emitted += 1;
                    if event.timestamp > status.last_seen {
                        status.last_seen = event.timestamp;
                    }
                })
                .or_insert_with(|| ActorStatus {
                    actor_id: event.from.clone(),
                    last_seen: event.timestamp,
                    events_emitted: 1,
                });
        }

        let mut actors: Vec<ActorStatus> = by_actor.into_values().collect();
        actors.sort_by(|a, b| a.actor_id.cmp(&b.actor_id));

        Self { actors, active_agents, logged_events: events.len() }
    }
}
