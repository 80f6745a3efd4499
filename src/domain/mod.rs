//! Domain layer
//!
//! Entities, invariants and repository interfaces. Nothing here talks to
//! a database or a clock beyond `Utc::now()` for audit timestamps.

pub mod cart;
pub mod catalog;
pub mod identity;
pub mod repositories;
pub mod reservation;

pub use cart::{BillSummary, Cart, CartLine};
pub use catalog::{Service, ServiceCatalog, ServiceId};
pub use identity::{Actor, AuthContext, CustomerId, Role, StaticAuthContext};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{
    LifecycleAction, Reservation, ReservationDraft, ReservationFilter, ReservationId,
    ReservationRepository, ReservationStatus, Schedule, TimeWindow,
};

pub use crate::shared::errors::{DomainError, ErrorKind};
