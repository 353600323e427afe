//! Events exchanged over the bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Reserved address that fans out to every broadcast subscriber.
pub const BROADCAST_ADDR: &str = "all";

/// Default monitor actor. Receives a mirrored copy of cross-module traffic.
pub const DEFAULT_MONITOR: &str = "michael";

/// Default maximum number of events retained in the persisted log.
pub const MAX_LOG_SIZE: usize = 100;

/// Where an event is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recipient {
    /// Every subscriber listening on the broadcast address
    All,
    /// A single named actor
    Actor(String),
}

impl Recipient {
    /// Address a single actor. The broadcast address normalizes to `All`.
    pub fn actor(id: impl Into<String>) -> Self {
        let id = id.into();
        if id == BROADCAST_ADDR {
            Self::All
        } else {
            Self::Actor(id)
        }
    }

    /// The wire form of this address.
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => BROADCAST_ADDR,
            Self::Actor(id) => id,
        }
    }

    /// True when this address names exactly `id`.
    pub fn is_actor(&self, id: &str) -> bool {
        matches!(self, Self::Actor(actor) if actor == id)
    }
}

impl From<String> for Recipient {
    fn from(value: String) -> Self {
        Self::actor(value)
    }
}

impl From<Recipient> for String {
    fn from(value: Recipient) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity levels for health alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Wire form of an event body: a tag plus an arbitrary JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawPayload {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    payload: Value,
}

/// The payload shapes this layer knows how to emit and match on.
///
/// Tags and bodies are kept stable on the wire; `Opaque` carries anything
/// outside the known set without loss, so decoding never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPayload", into = "RawPayload")]
pub enum EventPayload {
    /// Free-form message between actors
    ChatMessage {
        content: String,
        channel: Option<String>,
    },
    /// A task was assigned to the addressed actor
    TaskAssigned { task_id: String, title: String },
    /// A previously assigned task finished
    TaskCompleted { task_id: String },
    /// A health check crossed a threshold
    HealthAlert {
        severity: AlertSeverity,
        detail: String,
    },
    /// Account balance refreshed from the finance backend
    FinanceSync { account: String, balance_cents: i64 },
    /// A memory fragment was written to long-term storage
    EngramStored { engram_id: String, kind: String },
    /// Lightweight liveness signal
    StatusPing,
    /// Any tag outside the known set, preserved verbatim
    Opaque { event_type: String, payload: Value },
}

/// Shadow of `EventPayload` used purely for (de)serializing the known tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
enum KnownPayload {
    ChatMessage {
        content: String,
        #[serde(default)]
        channel: Option<String>,
    },
    TaskAssigned {
        task_id: String,
        title: String,
    },
    TaskCompleted {
        task_id: String,
    },
    HealthAlert {
        severity: AlertSeverity,
        detail: String,
    },
    FinanceSync {
        account: String,
        balance_cents: i64,
    },
    EngramStored {
        engram_id: String,
        kind: String,
    },
    StatusPing,
}

impl From<KnownPayload> for EventPayload {
    fn from(known: KnownPayload) -> Self {
        match known {
            KnownPayload::ChatMessage { content, channel } => Self::ChatMessage { content, channel },
            KnownPayload::TaskAssigned { task_id, title } => Self::TaskAssigned { task_id, title },
            KnownPayload::TaskCompleted { task_id } => Self::TaskCompleted { task_id },
            KnownPayload::HealthAlert { severity, detail } => Self::HealthAlert { severity, detail },
            KnownPayload::FinanceSync { account, balance_cents } => {
                Self::FinanceSync { account, balance_cents }
            }
            KnownPayload::EngramStored { engram_id, kind } => Self::EngramStored { engram_id, kind },
            KnownPayload::StatusPing => Self::StatusPing,
        }
    }
}

impl From<RawPayload> for EventPayload {
    fn from(raw: RawPayload) -> Self {
        let candidate = serde_json::json!({
            "type": raw.event_type.clone(),
            "payload": raw.payload.clone(),
        });
        match serde_json::from_value::<KnownPayload>(candidate) {
            Ok(known) => known.into(),
            Err(_) => Self::Opaque { event_type: raw.event_type, payload: raw.payload },
        }
    }
}

impl From<EventPayload> for RawPayload {
    fn from(payload: EventPayload) -> Self {
        let known = match payload {
            EventPayload::Opaque { event_type, payload } => return Self { event_type, payload },
            EventPayload::ChatMessage { content, channel } => {
                KnownPayload::ChatMessage { content, channel }
            }
            EventPayload::TaskAssigned { task_id, title } => {
                KnownPayload::TaskAssigned { task_id, title }
            }
            EventPayload::TaskCompleted { task_id } => KnownPayload::TaskCompleted { task_id },
            EventPayload::HealthAlert { severity, detail } => {
                KnownPayload::HealthAlert { severity, detail }
            }
            EventPayload::FinanceSync { account, balance_cents } => {
                KnownPayload::FinanceSync { account, balance_cents }
            }
            EventPayload::EngramStored { engram_id, kind } => {
                KnownPayload::EngramStored { engram_id, kind }
            }
            EventPayload::StatusPing => KnownPayload::StatusPing,
        };

        // Adjacent tagging yields {"type": ..., "payload": ...}; split it back out.
        let mut value = serde_json::to_value(&known).unwrap_or(Value::Null);
        let event_type =
            value.get("type").and_then(Value::as_str).unwrap_or("unknown").to_string();
        let payload = value.get_mut("payload").map(Value::take).unwrap_or(Value::Null);
        Self { event_type, payload }
    }
}

impl EventPayload {
    /// The wire tag for this payload.
    pub fn event_type(&self) -> &str {
        match self {
            Self::ChatMessage { .. } => "chat_message",
            Self::TaskAssigned { .. } => "task_assigned",
            Self::TaskCompleted { .. } => "task_completed",
            Self::HealthAlert { .. } => "health_alert",
            Self::FinanceSync { .. } => "finance_sync",
            Self::EngramStored { .. } => "engram_stored",
            Self::StatusPing => "status_ping",
            Self::Opaque { event_type, .. } => event_type,
        }
    }
}

/// One addressed event as emitted, delivered, and persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaintEvent {
    /// Unique event id, assigned at emission
    pub id: Uuid,
    /// Emitting actor
    pub from: String,
    /// Target address
    pub to: Recipient,
    /// Typed body; flattens to `type` + `payload` on the wire
    #[serde(flatten)]
    pub payload: EventPayload,
    /// Emission time (UTC)
    pub timestamp: DateTime<Utc>,
}

impl SaintEvent {
    /// Build a new event stamped with a fresh id and the current time.
    pub fn new(from: impl Into<String>, to: Recipient, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: from.into(),
            to,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// The wire tag of this event's payload.
    pub fn event_type(&self) -> &str {
        self.payload.event_type()
    }
}

/// Predicate over persisted events. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Only events emitted by this actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Only events addressed to this recipient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Recipient>,
    /// Only events with this wire tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl EventFilter {
    /// Matches every event.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_actor(mut self, id: impl Into<String>) -> Self {
        self.from = Some(id.into());
        self
    }

    pub fn addressed_to(mut self, to: Recipient) -> Self {
        self.to = Some(to);
        self
    }

    pub fn of_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// True when every set field matches the event.
    pub fn matches(&self, event: &SaintEvent) -> bool {
        if let Some(from) = &self.from {
            if &event.from != from {
                return false;
            }
        }
        if let Some(to) = &self.to {
            if &event.to != to {
                return false;
            }
        }
        if let Some(event_type) = &self.event_type {
            if event.event_type() != event_type {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_normalizes_broadcast() {
        assert_eq!(Recipient::actor("all"), Recipient::All);
        assert_eq!(Recipient::actor("joseph"), Recipient::Actor("joseph".to_string()));

        let parsed: Recipient = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(parsed, Recipient::All);

        let json = serde_json::to_string(&Recipient::actor("raphael")).unwrap();
        assert_eq!(json, "\"raphael\"");
    }

    #[test]
    fn test_known_payload_round_trip() {
        let payload = EventPayload::TaskAssigned {
            task_id: "task-42".to_string(),
            title: "Water the garden".to_string(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "task_assigned");
        assert_eq!(json["payload"]["task_id"], "task-42");

        let back: EventPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_unknown_tag_decodes_as_opaque() {
        let json = serde_json::json!({
            "type": "webhook_received",
            "payload": { "source": "github" },
        });

        let payload: EventPayload = serde_json::from_value(json).unwrap();
        match payload {
            EventPayload::Opaque { event_type, payload } => {
                assert_eq!(event_type, "webhook_received");
                assert_eq!(payload["source"], "github");
            }
            other => panic!("expected opaque payload, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_known_shape_decodes_as_opaque() {
        // Known tag, wrong body: preserved rather than rejected.
        let json = serde_json::json!({
            "type": "chat_message",
            "payload": { "content": 42 },
        });

        let payload: EventPayload = serde_json::from_value(json).unwrap();
        assert!(matches!(payload, EventPayload::Opaque { .. }));
    }

    #[test]
    fn test_event_type_accessor_matches_wire_tag() {
        let cases = vec![
            EventPayload::ChatMessage { content: "hi".to_string(), channel: None },
            EventPayload::TaskAssigned { task_id: "t".to_string(), title: "x".to_string() },
            EventPayload::TaskCompleted { task_id: "t".to_string() },
            EventPayload::HealthAlert {
                severity: AlertSeverity::Warning,
                detail: "cpu".to_string(),
            },
            EventPayload::FinanceSync { account: "a".to_string(), balance_cents: 100 },
            EventPayload::EngramStored { engram_id: "e".to_string(), kind: "note".to_string() },
            EventPayload::StatusPing,
        ];

        for payload in cases {
            let json = serde_json::to_value(&payload).unwrap();
            assert_eq!(json["type"], payload.event_type());
        }
    }

    #[test]
    fn test_saint_event_flattens_payload() {
        let event = SaintEvent::new(
            "joseph",
            Recipient::actor("raphael"),
            EventPayload::StatusPing,
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["from"], "joseph");
        assert_eq!(json["to"], "raphael");
        assert_eq!(json["type"], "status_ping");

        let back: SaintEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_filter_matching() {
        let event = SaintEvent::new(
            "joseph",
            Recipient::All,
            EventPayload::ChatMessage { content: "hello".to_string(), channel: None },
        );

        assert!(EventFilter::all().matches(&event));
        assert!(EventFilter::all().from_actor("joseph").matches(&event));
        assert!(!EventFilter::all().from_actor("raphael").matches(&event));
        assert!(EventFilter::all().addressed_to(Recipient::All).matches(&event));
        assert!(!EventFilter::all()
            .addressed_to(Recipient::actor("michael"))
            .matches(&event));
        assert!(EventFilter::all()
            .from_actor("joseph")
            .of_type("chat_message")
            .matches(&event));
        assert!(!EventFilter::all().of_type("status_ping").matches(&event));
    }
}
