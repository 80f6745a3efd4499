//! Lifecycle controller operations
//!
//! Every operation names its actor explicitly. Ownership and role are
//! checked first, then the transition table, then the write.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use super::builder::ReservationBuilder;
use crate::domain::reservation::lifecycle::authorize;
use crate::domain::{
    Actor, CustomerId, DomainError, DomainResult, LifecycleAction, RepositoryProvider,
    Reservation, ReservationFilter, ReservationId, ReservationStatus, Schedule, ServiceId,
};
use crate::notifications::{
    Event, ReservationCreatedEvent, ReservationDeletedEvent, ReservationRescheduledEvent,
    ReservationStatusChangedEvent, SharedEventBus,
};
use crate::shared::require_schedule;

fn record_transition(action: &'static str) {
    metrics::counter!("booking_transitions_total", "action" => action).increment(1);
}

/// Reservation lifecycle service
pub struct LifecycleService {
    repos: Arc<dyn RepositoryProvider>,
    builder: ReservationBuilder,
    event_bus: Option<SharedEventBus>,
}

impl LifecycleService {
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

    /// Load one reservation the actor is allowed to see
    pub async fn get(&self, actor: &Actor, id: &ReservationId) -> DomainResult<Reservation> {
        let reservation = self.load(id).await?;
        if !actor.is_admin() && reservation.customer_id != *actor.id() {
            return Err(DomainError::Forbidden(format!(
                "reservation {} belongs to another customer",
                id
            )));
        }
        Ok(reservation)
    }

    /// Move a reservation to a new date and time.
    ///
    /// The new end time uses the service's current catalog duration. An
    /// administrator rescheduling a pending booking also confirms it.
    pub async fn reschedule(
        &self,
        actor: &Actor,
        id: &ReservationId,
        date: Option<NaiveDate>,
        time: Option<&str>,
    ) -> DomainResult<Reservation> {
        let (date, time) = require_schedule(date, time)?;
        let mut reservation = self.load(id).await?;
        let version = reservation.updated_at;
        authorize(actor, &reservation, LifecycleAction::Reschedule)?;

        let service = self
            .repos
            .catalog()
            .find_by_id(&reservation.service_id)
            .await?;
        let window = self
            .builder
            .window(service.as_ref(), &Schedule::new(date, time))?;

        let old_start = reservation.start_time;
        reservation.reschedule(window, actor.is_admin())?;
        self.repos
            .reservations()
            .update(reservation.clone(), version)
            .await?;

        record_transition(LifecycleAction::Reschedule.as_str());
        info!(
            reservation_id = %id,
            actor = actor.label(),
            start = %reservation.start_time,
            end = %reservation.end_time,
            status = %reservation.status,
            "Reservation rescheduled"
        );
        self.publish(Event::ReservationRescheduled(ReservationRescheduledEvent {
            reservation_id: reservation.id,
            customer_id: reservation.customer_id.clone(),
            old_start,
            new_start: reservation.start_time,
            new_end: reservation.end_time,
            status: reservation.status,
            actor: actor.label().to_string(),
            timestamp: Utc::now(),
        }));

        Ok(reservation)
    }

    pub async fn cancel(&self, actor: &Actor, id: &ReservationId) -> DomainResult<Reservation> {
        self.transition(actor, id, LifecycleAction::Cancel).await
    }

    /// Admin only
    pub async fn complete(&self, actor: &Actor, id: &ReservationId) -> DomainResult<Reservation> {
        self.transition(actor, id, LifecycleAction::Complete).await
    }

    /// Admin only; Pending -> Confirmed
    pub async fn confirm(&self, actor: &Actor, id: &ReservationId) -> DomainResult<Reservation> {
        self.transition(actor, id, LifecycleAction::Confirm).await
    }

    /// Hard delete, admin only, any status
    pub async fn delete(&self, actor: &Actor, id: &ReservationId) -> DomainResult<()> {
        let reservation = self.load(id).await?;
        authorize(actor, &reservation, LifecycleAction::Delete)?;
        self.repos.reservations().delete(id).await?;

        record_transition(LifecycleAction::Delete.as_str());
        info!(reservation_id = %id, actor = actor.label(), "Reservation deleted");
        self.publish(Event::ReservationDeleted(ReservationDeletedEvent {
            reservation_id: reservation.id,
            customer_id: reservation.customer_id,
            status: reservation.status,
            timestamp: Utc::now(),
        }));
        Ok(())
    }

    /// Insert a booking on a customer's behalf, starting Pending or Confirmed
    #[allow(clippy::too_many_arguments)]
    pub async fn admin_create(
        &self,
        actor: &Actor,
        customer_id: &CustomerId,
        service_id: &ServiceId,
        quantity: u32,
        date: Option<NaiveDate>,
        time: Option<&str>,
        status: ReservationStatus,
    ) -> DomainResult<Reservation> {
        if !actor.is_admin() {
            return Err(DomainError::Forbidden(
                "only an administrator may create reservations directly".into(),
            ));
        }
        if status.is_terminal() {
            return Err(DomainError::Validation(format!(
                "A new reservation cannot start {}",
                status
            )));
        }
        let (date, time) = require_schedule(date, time)?;

        let service = self
            .builder
            .resolve(self.repos.catalog(), service_id, service_id.as_str())
            .await?;
        let draft = self.builder.draft(
            customer_id,
            &service,
            quantity,
            &Schedule::new(date, time),
            status,
        )?;
        let reservation = Reservation::from_draft(draft);
        self.repos.reservations().insert(reservation.clone()).await?;

        record_transition("create");
        info!(
            reservation_id = %reservation.id,
            customer_id = %customer_id,
            service_id = %service_id,
            status = %status,
            "Reservation created by admin"
        );
        self.publish(Event::ReservationCreated(
            ReservationCreatedEvent::from_reservation(&reservation),
        ));
        Ok(reservation)
    }

    /// Reservations visible to the actor, latest start first.
    ///
    /// Customers are always scoped to their own reservations; asking for
    /// someone else's is `Forbidden`.
    pub async fn list_reservations(
        &self,
        actor: &Actor,
        filter: ReservationFilter,
    ) -> DomainResult<Vec<Reservation>> {
        let filter = match actor {
            Actor::Admin(_) => filter,
            Actor::Customer(id) => match &filter.customer_id {
                Some(requested) if requested != id => {
                    return Err(DomainError::Forbidden(
                        "customers may only list their own reservations".into(),
                    ))
                }
                _ => ReservationFilter {
                    customer_id: Some(id.clone()),
                    ..filter
                },
            },
        };
        let found = self.repos.reservations().query(&filter).await?;
        debug!(actor = actor.label(), count = found.len(), "Listed reservations");
        Ok(found)
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: &ReservationId,
        action: LifecycleAction,
    ) -> DomainResult<Reservation> {
        let mut reservation = self.load(id).await?;
        let version = reservation.updated_at;
        authorize(actor, &reservation, action)?;

        let old_status = reservation.status;
        match action {
            LifecycleAction::Cancel => reservation.cancel()?,
            LifecycleAction::Complete => reservation.complete()?,
            LifecycleAction::Confirm => reservation.confirm()?,
            LifecycleAction::Reschedule | LifecycleAction::Delete => {
                return Err(DomainError::Validation(format!(
                    "{} is not a status change",
                    action.as_str()
                )))
            }
        }
        self.repos
            .reservations()
            .update(reservation.clone(), version)
            .await?;

        record_transition(action.as_str());
        info!(
            reservation_id = %id,
            action = action.as_str(),
            actor = actor.label(),
            from = %old_status,
            to = %reservation.status,
            "Reservation status changed"
        );
        self.publish(Event::ReservationStatusChanged(ReservationStatusChangedEvent {
            reservation_id: reservation.id,
            customer_id: reservation.customer_id.clone(),
            old_status,
            new_status: reservation.status,
            actor: actor.label().to_string(),
            timestamp: Utc::now(),
        }));

        Ok(reservation)
    }

    async fn load(&self, id: &ReservationId) -> DomainResult<Reservation> {
        self.repos
            .reservations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::reservation_not_found(id))
    }

    fn publish(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}
