//! # Change Notifier
//!
//! Tells other session participants that an expenditure changed.
//!
//! ## Delivery Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Change Notification                              │
//! │                                                                         │
//! │  ExpenditureService                                                    │
//! │       │ (only after COMMIT)                                            │
//! │       ▼                                                                 │
//! │  ChangeNotifier::notify(&ChangeEvent)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BroadcastNotifier ──► tokio::sync::broadcast ──┬──► subscriber 1      │
//! │                                                 ├──► subscriber 2      │
//! │                                                 └──► ...               │
//! │                                                                         │
//! │  A failed notify is logged by the caller. It never undoes the write.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscribers filter by `session_id` themselves; the transport that pushes
//! events to devices lives outside this crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;
use ts_rs::TS;

// =============================================================================
// Events
// =============================================================================

/// What happened to an expenditure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum EventKind {
    /// Created or replaced; the payload is the full record.
    ExpenditureCreated,

    /// Deleted; the payload carries the identifier.
    ExpenditureDeleted,
}

/// One change, addressed to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ChangeEvent {
    pub session_id: String,

    /// Member whose request caused the change.
    pub acting_member_id: String,

    pub kind: EventKind,

    #[ts(type = "unknown")]
    pub payload: serde_json::Value,
}

/// Notification delivery failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The payload could not be encoded.
    #[error("Failed to encode notification payload: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The transport refused the event.
    #[error("Notification transport failed: {0}")]
    Transport(String),
}

// =============================================================================
// Notifier Trait
// =============================================================================

/// Sink for change events.
///
/// Called synchronously after a successful commit. Implementations must not
/// block for long.
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, event: &ChangeEvent) -> Result<(), NotifyError>;
}

// =============================================================================
// Broadcast Notifier
// =============================================================================

/// In-process fan-out over a tokio broadcast channel.
///
/// Slow subscribers that fall more than `capacity` events behind see
/// `RecvError::Lagged` and skip ahead.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastNotifier {
    /// Creates a notifier buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        BroadcastNotifier { tx }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn notify(&self, event: &ChangeEvent) -> Result<(), NotifyError> {
        match self.tx.send(event.clone()) {
            Ok(delivered) => {
                debug!(
                    session_id = %event.session_id,
                    kind = ?event.kind,
                    subscribers = delivered,
                    "Change event broadcast"
                );
            }
            // Nobody listening is not a failure.
            Err(_) => {
                debug!(session_id = %event.session_id, "No subscribers for change event");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind) -> ChangeEvent {
        ChangeEvent {
            session_id: "trip".to_string(),
            acting_member_id: "alice".to_string(),
            kind,
            payload: serde_json::json!({ "expenditureId": "e-1" }),
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let notifier = BroadcastNotifier::new(8);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);

        notifier.notify(&event(EventKind::ExpenditureCreated)).unwrap();

        assert_eq!(first.recv().await.unwrap().kind, EventKind::ExpenditureCreated);
        assert_eq!(second.recv().await.unwrap().payload["expenditureId"], "e-1");
    }

    #[test]
    fn test_no_subscribers_is_ok() {
        let notifier = BroadcastNotifier::new(8);
        assert!(notifier.notify(&event(EventKind::ExpenditureDeleted)).is_ok());
    }

    #[test]
    fn test_zero_capacity_does_not_panic() {
        let notifier = BroadcastNotifier::new(0);
        let _rx = notifier.subscribe();
        assert!(notifier.notify(&event(EventKind::ExpenditureCreated)).is_ok());
    }

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(event(EventKind::ExpenditureDeleted)).unwrap();
        assert_eq!(json["sessionId"], "trip");
        assert_eq!(json["actingMemberId"], "alice");
        assert_eq!(json["kind"], "ExpenditureDeleted");
    }
}
