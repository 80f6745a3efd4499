//! Broadcast bus for reservation events
//!
//! Publishing never blocks a write: a change with nobody listening is
//! dropped, and a subscriber that falls behind skips what it missed.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::broadcast::{self, error::RecvError};

use super::events::{Event, EventMessage};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` events are buffered per subscriber before it starts lagging
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Fan `event` out to current subscribers; returns how many received it
    pub fn publish(&self, event: Event) -> usize {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let reservation = message.event.reservation_id();

        match self.sender.send(message) {
            Ok(reached) => {
                debug!("Published {} ({:?}) to {} subscriber(s)", event_type, reservation, reached);
                reached
            }
            Err(_) => {
                debug!("No subscribers for {} ({:?})", event_type, reservation);
                0
            }
        }
    }

    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
}

impl EventSubscriber {
    /// Next event, or `None` once every bus handle is gone
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(RecvError::Lagged(missed)) => {
                    warn!("Event subscriber fell behind, skipped {} event(s)", missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerId, ReservationId, ReservationStatus};
    use crate::notifications::events::{ReservationDeletedEvent, ReservationStatusChangedEvent};
    use chrono::Utc;
    use std::time::Duration;

    fn cancelled(id: ReservationId) -> Event {
        Event::ReservationStatusChanged(ReservationStatusChangedEvent {
            reservation_id: id,
            customer_id: CustomerId::from("u-1"),
            old_status: ReservationStatus::Confirmed,
            new_status: ReservationStatus::Cancelled,
            actor: "customer".to_string(),
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let id = ReservationId::new();
        assert_eq!(bus.publish(cancelled(id)), 2);

        for sub in [&mut first, &mut second] {
            let received = tokio::time::timeout(Duration::from_millis(100), sub.recv())
                .await
                .expect("Timeout")
                .expect("No message");
            assert_eq!(received.event.event_type(), "reservation_status_changed");
            assert_eq!(received.event.reservation_id(), Some(id));
        }
    }

    #[test]
    fn publishing_to_nobody_is_dropped() {
        let bus = EventBus::new();
        let reached = bus.publish(Event::ReservationDeleted(ReservationDeletedEvent {
            reservation_id: ReservationId::new(),
            customer_id: CustomerId::from("u-1"),
            status: ReservationStatus::Completed,
            timestamp: Utc::now(),
        }));
        assert_eq!(reached, 0);
    }

    #[tokio::test]
    async fn slow_subscriber_skips_to_what_is_still_buffered() {
        let bus = EventBus::with_capacity(2);
        let mut sub = bus.subscribe();
        let ids = [ReservationId::new(), ReservationId::new(), ReservationId::new()];
        for id in ids {
            bus.publish(cancelled(id));
        }

        let next = sub.recv().await.unwrap();
        assert_eq!(next.event.reservation_id(), Some(ids[1]));
        let last = sub.recv().await.unwrap();
        assert_eq!(last.event.reservation_id(), Some(ids[2]));
    }

    #[tokio::test]
    async fn subscriber_ends_when_bus_is_dropped() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        drop(bus);
        assert!(sub.recv().await.is_none());
    }
}
