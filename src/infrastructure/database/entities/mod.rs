//! Database entities module

pub mod reservation;
pub mod service;

pub use reservation::Entity as Reservation;
pub use service::Entity as Service;
