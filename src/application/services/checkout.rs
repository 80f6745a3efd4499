//! Checkout orchestrator
//!
//! One customer action turns every cart line into its own reservation.
//! Lines succeed or fail independently; nothing already stored is rolled
//! back when a later line fails.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::builder::ReservationBuilder;
use crate::domain::{
    Cart, CartLine, CustomerId, DomainResult, ErrorKind, RepositoryProvider, Reservation,
    ReservationId, Schedule, ServiceId,
};
use crate::notifications::{
    CheckoutCompletedEvent, Event, ReservationCreatedEvent, SharedEventBus,
};
use crate::shared::require_schedule;

/// A line that became a reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedLine {
    pub service_id: ServiceId,
    pub reservation_id: ReservationId,
}

/// A line that did not
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedLine {
    pub service_id: ServiceId,
    /// Display name to surface to the customer
    pub title: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Per-line outcome of one checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub succeeded: Vec<ReservedLine>,
    pub failed: Vec<FailedLine>,
}

impl BatchResult {
    pub fn succeeded_ids(&self) -> Vec<ReservationId> {
        self.succeeded.iter().map(|l| l.reservation_id).collect()
    }

    pub fn reserved_services(&self) -> impl Iterator<Item = &ServiceId> {
        self.succeeded.iter().map(|l| &l.service_id)
    }

    /// Nothing was attempted (empty cart)
    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty()
    }

    /// "No booking was created": lines were attempted and none stuck
    pub fn is_total_failure(&self) -> bool {
        self.succeeded.is_empty() && !self.failed.is_empty()
    }

    /// Drop exactly the reserved lines from the cart; failed lines stay
    pub fn apply_to(&self, cart: &mut Cart) {
        cart.remove_services(self.reserved_services());
    }
}

/// Checkout service
pub struct CheckoutService {
    repos: Arc<dyn RepositoryProvider>,
    builder: ReservationBuilder,
    event_bus: Option<SharedEventBus>,
}

impl CheckoutService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, builder: ReservationBuilder) -> Self {
        Self {
            repos,
            builder,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: SharedEventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Reserve every line of `cart` at the chosen date and time.
    ///
    /// Only a missing or unreadable schedule fails the whole call, and it
    /// does so before the store is touched. Every other problem is recorded
    /// against its line in the returned [`BatchResult`].
    pub async fn checkout(
        &self,
        customer_id: &CustomerId,
        cart: &Cart,
        date: Option<NaiveDate>,
        time: Option<&str>,
    ) -> DomainResult<BatchResult> {
        if cart.is_empty() {
            return Ok(BatchResult::default());
        }

        let (date, time) = require_schedule(date, time)?;
        let schedule = Schedule::new(date, time);

        let mut result = BatchResult::default();
        for line in cart.lines() {
            match self.reserve_line(customer_id, line, &schedule).await {
                Ok(reservation) => {
                    metrics::counter!("booking_checkout_lines_total", "outcome" => "succeeded")
                        .increment(1);
                    self.publish(Event::ReservationCreated(
                        ReservationCreatedEvent::from_reservation(&reservation),
                    ));
                    result.succeeded.push(ReservedLine {
                        service_id: line.service.id.clone(),
                        reservation_id: reservation.id,
                    });
                }
                Err(e) => {
                    metrics::counter!("booking_checkout_lines_total", "outcome" => "failed")
                        .increment(1);
                    warn!(
                        customer_id = %customer_id,
                        service_id = %line.service.id,
                        kind = %e.kind(),
                        error = %e,
                        "Checkout line failed"
                    );
                    result.failed.push(FailedLine {
                        service_id: line.service.id.clone(),
                        title: line.service.title.clone(),
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            customer_id = %customer_id,
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "Checkout finished"
        );
        self.publish(Event::CheckoutCompleted(CheckoutCompletedEvent {
            customer_id: customer_id.clone(),
            succeeded: result.succeeded.len(),
            failed: result.failed.len(),
            timestamp: Utc::now(),
        }));

        Ok(result)
    }

    async fn reserve_line(
        &self,
        customer_id: &CustomerId,
        line: &CartLine,
        schedule: &Schedule,
    ) -> DomainResult<Reservation> {
        let draft = self
            .builder
            .build(self.repos.catalog(), customer_id, line, schedule)
            .await?;
        let reservation = Reservation::from_draft(draft);
        self.repos.reservations().insert(reservation.clone()).await?;
        Ok(reservation)
    }

    fn publish(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}
