//! # Event Publisher
//!
//! In-process bus for lifecycle events. The broker relay subscribes here
//! and forwards envelopes downstream; delivery is at-least-once, so every
//! envelope carries a stable `event_id` for consumer-side dedupe.
//!
//! Publication happens only after the triggering state transition has
//! committed, and a publish failure is logged rather than unwound into the
//! already-committed transition.

use dashmap::DashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use super::payloads::{DispatchEvent, EventEnvelope};

/// Broadcast-backed publisher with an idempotency guard.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<EventEnvelope>,
    seen: Arc<DashSet<Uuid>>,
}

impl EventPublisher {
    /// Create a publisher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            seen: Arc::new(DashSet::new()),
        }
    }

    /// Wrap a payload in a fresh envelope and publish it. Returns the
    /// envelope's idempotency key.
    pub fn publish(&self, payload: DispatchEvent) -> Uuid {
        let envelope = EventEnvelope::new(payload);
        let event_id = envelope.event_id;
        self.publish_envelope(envelope);
        event_id
    }

    /// Publish a pre-built envelope. A duplicate `event_id` is dropped so a
    /// retried publish cannot double-emit.
    pub fn publish_envelope(&self, envelope: EventEnvelope) {
        if !self.seen.insert(envelope.event_id) {
            debug!(
                event_id = %envelope.event_id,
                event = envelope.payload.name(),
                "duplicate event id, publish skipped"
            );
            return;
        }

        let name = envelope.payload.name();
        let event_id = envelope.event_id;
        match self.sender.send(envelope) {
            Ok(receivers) => {
                debug!(event = name, event_id = %event_id, receivers, "event published");
            }
            Err(broadcast::error::SendError(_)) => {
                // No subscriber is wired yet; the transition already
                // committed, so this is a lost notification, not an error
                // to surface.
                warn!(event = name, event_id = %event_id, "event published with no subscribers");
            }
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn postponed_event() -> DispatchEvent {
        DispatchEvent::ParcelPostponed {
            assignment_id: Uuid::new_v4(),
            parcel_id: Uuid::new_v4(),
            session_id: None,
            delivery_man_id: Uuid::new_v4(),
            requested_time: Utc::now(),
            reason: "call back tomorrow".to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let publisher = EventPublisher::new(16);
        let mut rx = publisher.subscribe();

        let event_id = publisher.publish(postponed_event());
        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_id, event_id);
        assert_eq!(received.payload.name(), "parcel-postponed");
    }

    #[tokio::test]
    async fn test_duplicate_event_id_is_published_once() {
        let publisher = EventPublisher::new(16);
        let mut rx = publisher.subscribe();

        let envelope = EventEnvelope::new(postponed_event());
        publisher.publish_envelope(envelope.clone());
        publisher.publish_envelope(envelope.clone());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.event_id, envelope.event_id);
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_publish_without_subscribers_does_not_fail() {
        tokio_test::block_on(async {
            let publisher = EventPublisher::new(16);
            // Must not panic or error; the transition is already committed
            publisher.publish(postponed_event());
            assert_eq!(publisher.subscriber_count(), 0);
        });
    }
}
