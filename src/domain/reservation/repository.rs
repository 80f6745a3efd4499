//! Reservation repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Reservation, ReservationFilter, ReservationId};
use crate::domain::{DomainError, DomainResult};

/// Durable reservation store.
///
/// Implementations own the overlap invariant: when enforced, `insert` and
/// `update` reject (`Conflict`) an active reservation whose window overlaps
/// another active one for the same customer and service, and perform the
/// check and the write as one step.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Store a new reservation
    async fn insert(&self, reservation: Reservation) -> DomainResult<ReservationId>;

    /// Find reservation by ID
    async fn find_by_id(&self, id: &ReservationId) -> DomainResult<Option<Reservation>>;

    /// Replace an existing reservation, provided the stored copy still
    /// carries `expected` as its `updated_at`.
    ///
    /// A record changed since it was read fails with [`stale_write`]'s
    /// error; a record deleted in the meantime fails with `NotFound`.
    async fn update(&self, reservation: Reservation, expected: DateTime<Utc>) -> DomainResult<()>;

    /// Remove a reservation for good
    async fn delete(&self, id: &ReservationId) -> DomainResult<()>;

    /// Matching reservations, latest start first
    async fn query(&self, filter: &ReservationFilter) -> DomainResult<Vec<Reservation>>;
}

/// Error for an update whose read is out of date.
///
/// A record that reached a terminal status in between reports the
/// transition that can no longer happen.
pub fn stale_write(stored: Option<&Reservation>, id: &ReservationId) -> DomainError {
    match stored {
        None => DomainError::reservation_not_found(id),
        Some(current) if current.status.is_terminal() => DomainError::InvalidTransition {
            from: current.status.as_str(),
            action: "change",
        },
        Some(_) => DomainError::Conflict(format!("reservation {} was changed by another request", id)),
    }
}
