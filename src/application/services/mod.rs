//! Application services

mod builder;
mod checkout;
mod lifecycle;

pub use builder::{ReservationBuilder, DEFAULT_DURATION_MINUTES};
pub use checkout::{BatchResult, CheckoutService, FailedLine, ReservedLine};
pub use lifecycle::LifecycleService;
