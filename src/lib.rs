//! # Booking Engine
//!
//! Reservation and lifecycle engine for a storefront that sells
//! time-boxed services (lawn mowing, hedge trimming, ...).
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Cart, catalog, reservation entities, the status state machine and repository traits
//! - **application**: Reservation builder, checkout orchestrator and lifecycle service
//! - **infrastructure**: In-memory and SeaORM (SQLite) storage
//! - **notifications**: Broadcast bus for reservation events
//! - **runtime**: Tracing setup and the [`EngineHandle`] bootstrap

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod runtime;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{BatchResult, CheckoutService, LifecycleService, ReservationBuilder};
pub use domain::{
    Actor, Cart, CustomerId, DomainError, DomainResult, ErrorKind, Reservation, ReservationFilter,
    ReservationId, ReservationStatus, Service, ServiceId,
};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export notifications
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};

pub use runtime::{init_tracing, EngineHandle, EngineOptions};
