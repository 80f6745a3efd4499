//! Application layer
//!
//! Use cases over the domain: building drafts from a cart, running a
//! checkout, and driving reservations through their lifecycle.

pub mod services;

pub use services::{
    BatchResult, CheckoutService, FailedLine, LifecycleService, ReservationBuilder, ReservedLine,
    DEFAULT_DURATION_MINUTES,
};
