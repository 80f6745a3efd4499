//! Reservation aggregate
//!
//! Contains the Reservation entity, its status state machine, and the
//! repository interface.

pub mod lifecycle;
pub mod model;
pub mod repository;

pub use lifecycle::LifecycleAction;
pub use model::{
    past, upcoming, Reservation, ReservationDraft, ReservationFilter, ReservationId,
    ReservationStatus, Schedule, TimeWindow,
};
pub use repository::{stale_write, ReservationRepository};
