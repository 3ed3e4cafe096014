//! Record lifecycle events.
//!
//! The service publishes a [`RecordEvent`] after each committed mutation.
//! Publishing never blocks and never fails the mutation: with no subscribers
//! the event is dropped, and slow subscribers see `Lagged` on their receiver.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::record::RecordId;

/// A committed change to a temperature record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RecordEvent {
    /// A record was created.
    Created {
        /// The new record's id.
        id: RecordId,
        /// When the change was committed.
        at: DateTime<Utc>,
    },
    /// A record was updated.
    Updated {
        /// The updated record's id.
        id: RecordId,
        /// When the change was committed.
        at: DateTime<Utc>,
    },
    /// A record was deleted.
    Deleted {
        /// The deleted record's id.
        id: RecordId,
        /// When the change was committed.
        at: DateTime<Utc>,
    },
}

impl RecordEvent {
    /// The id of the record this event is about.
    #[must_use]
    pub fn id(&self) -> RecordId {
        match self {
            Self::Created { id, .. } | Self::Updated { id, .. } | Self::Deleted { id, .. } => *id,
        }
    }

    /// Short lowercase name of the event kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted { .. } => "deleted",
        }
    }
}

/// Fan-out publisher for [`RecordEvent`]s.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<RecordEvent>,
}

impl EventPublisher {
    /// Create a publisher buffering up to `capacity` events per subscriber.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: RecordEvent) {
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let publisher = EventPublisher::new(8);
        let mut rx = publisher.subscribe();

        let event = RecordEvent::Created { id: 1, at: Utc::now() };
        publisher.publish(event);

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let publisher = EventPublisher::new(8);
        assert_eq!(publisher.subscriber_count(), 0);
        publisher.publish(RecordEvent::Deleted { id: 3, at: Utc::now() });
    }

    #[tokio::test]
    async fn test_lagging_subscriber_does_not_block_publisher() {
        let publisher = EventPublisher::new(1);
        let mut rx = publisher.subscribe();

        for id in 0..5 {
            publisher.publish(RecordEvent::Updated { id, at: Utc::now() });
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(rx.recv().await.unwrap().id(), 4);
    }

    #[test]
    fn test_event_accessors() {
        let at = Utc::now();
        assert_eq!(RecordEvent::Created { id: 1, at }.kind(), "created");
        assert_eq!(RecordEvent::Updated { id: 2, at }.kind(), "updated");
        assert_eq!(RecordEvent::Deleted { id: 3, at }.id(), 3);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = RecordEvent::Deleted {
            id: 9,
            at: Utc::now(),
        };
        let value = serde_json::to_value(event).unwrap();
        assert_eq!(value["type"], "deleted");
        assert_eq!(value["id"], 9);
    }
}
