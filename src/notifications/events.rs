//! Notification events
//!
//! Everything the engine broadcasts after a reservation write succeeds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{CustomerId, Reservation, ReservationId, ReservationStatus, ServiceId};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A reservation row was inserted (checkout or admin create)
    ReservationCreated(ReservationCreatedEvent),
    /// Start and end were moved
    ReservationRescheduled(ReservationRescheduledEvent),
    /// Cancel, complete or confirm
    ReservationStatusChanged(ReservationStatusChangedEvent),
    /// Row removed by an administrator
    ReservationDeleted(ReservationDeletedEvent),
    /// A cart checkout finished
    CheckoutCompleted(CheckoutCompletedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ReservationCreated(_) => "reservation_created",
            Event::ReservationRescheduled(_) => "reservation_rescheduled",
            Event::ReservationStatusChanged(_) => "reservation_status_changed",
            Event::ReservationDeleted(_) => "reservation_deleted",
            Event::CheckoutCompleted(_) => "checkout_completed",
        }
    }

    /// Customer the event concerns
    pub fn customer_id(&self) -> &CustomerId {
        match self {
            Event::ReservationCreated(e) => &e.customer_id,
            Event::ReservationRescheduled(e) => &e.customer_id,
            Event::ReservationStatusChanged(e) => &e.customer_id,
            Event::ReservationDeleted(e) => &e.customer_id,
            Event::CheckoutCompleted(e) => &e.customer_id,
        }
    }

    /// Reservation id if the event is about a single row
    pub fn reservation_id(&self) -> Option<ReservationId> {
        match self {
            Event::ReservationCreated(e) => Some(e.reservation_id),
            Event::ReservationRescheduled(e) => Some(e.reservation_id),
            Event::ReservationStatusChanged(e) => Some(e.reservation_id),
            Event::ReservationDeleted(e) => Some(e.reservation_id),
            Event::CheckoutCompleted(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreatedEvent {
    pub reservation_id: ReservationId,
    pub customer_id: CustomerId,
    pub service_id: ServiceId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub total_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl ReservationCreatedEvent {
    pub fn from_reservation(r: &Reservation) -> Self {
        Self {
            reservation_id: r.id,
            customer_id: r.customer_id.clone(),
            service_id: r.service_id.clone(),
            start_time: r.start_time,
            end_time: r.end_time,
            status: r.status,
            total_price: r.total_price,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRescheduledEvent {
    pub reservation_id: ReservationId,
    pub customer_id: CustomerId,
    pub old_start: DateTime<Utc>,
    pub new_start: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
    pub status: ReservationStatus,
    /// "customer" or "admin"
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusChangedEvent {
    pub reservation_id: ReservationId,
    pub customer_id: CustomerId,
    pub old_status: ReservationStatus,
    pub new_status: ReservationStatus,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDeletedEvent {
    pub reservation_id: ReservationId,
    pub customer_id: CustomerId,
    pub status: ReservationStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutCompletedEvent {
    pub customer_id: CustomerId,
    pub succeeded: usize,
    pub failed: usize,
    pub timestamp: DateTime<Utc>,
}

/// Wrapper for sending events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
