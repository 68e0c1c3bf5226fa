//! Lifecycle event payloads consumed by the downstream notification
//! service. Payload shapes are part of the external contract; field names
//! travel as camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Service tag stamped on every envelope.
pub const SOURCE_SERVICE: &str = "dispatch-core";

/// Lifecycle events produced by the orchestration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DispatchEvent {
    #[serde(rename_all = "camelCase")]
    SessionCompleted {
        session_id: Uuid,
        delivery_man_id: Uuid,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        total_tasks: i32,
        completed_tasks: i32,
        failed_tasks: i32,
        delayed_tasks: i32,
        parcel_ids: Vec<Uuid>,
        receiver_ids: Vec<Uuid>,
    },
    #[serde(rename_all = "camelCase")]
    AssignmentCompleted {
        assignment_id: Uuid,
        parcel_id: Uuid,
        parcel_code: String,
        session_id: Option<Uuid>,
        delivery_man_id: Uuid,
        delivery_man_name: String,
        receiver_id: Uuid,
        receiver_name: String,
        receiver_phone: String,
        completed_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    ParcelPostponed {
        assignment_id: Uuid,
        parcel_id: Uuid,
        session_id: Option<Uuid>,
        delivery_man_id: Uuid,
        requested_time: DateTime<Utc>,
        reason: String,
    },
}

impl DispatchEvent {
    /// Event name as it travels on the bus.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionCompleted { .. } => "session-completed",
            Self::AssignmentCompleted { .. } => "assignment-completed",
            Self::ParcelPostponed { .. } => "parcel-postponed",
        }
    }
}

/// At-least-once delivery envelope. Consumers dedupe on `event_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub source_service: String,
    pub published_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: DispatchEvent,
}

impl EventEnvelope {
    /// Wrap a payload with a fresh idempotency key.
    pub fn new(payload: DispatchEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            source_service: SOURCE_SERVICE.to_string(),
            published_at: Utc::now(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let envelope = EventEnvelope::new(DispatchEvent::ParcelPostponed {
            assignment_id: Uuid::new_v4(),
            parcel_id: Uuid::new_v4(),
            session_id: None,
            delivery_man_id: Uuid::new_v4(),
            requested_time: Utc::now(),
            reason: "receiver away until evening".to_string(),
        });

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "parcel-postponed");
        assert_eq!(json["sourceService"], SOURCE_SERVICE);
        assert!(json["eventId"].is_string());
        assert!(json["deliveryManId"].is_string());
    }

    #[test]
    fn test_event_names() {
        let event = DispatchEvent::SessionCompleted {
            session_id: Uuid::new_v4(),
            delivery_man_id: Uuid::new_v4(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            total_tasks: 3,
            completed_tasks: 2,
            failed_tasks: 1,
            delayed_tasks: 0,
            parcel_ids: vec![],
            receiver_ids: vec![],
        };
        assert_eq!(event.name(), "session-completed");
    }
}
