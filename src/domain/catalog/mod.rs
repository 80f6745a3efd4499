//! Service catalog
//!
//! Read-only view of the bookable services (price, duration, activity).

pub mod model;
pub mod repository;

pub use model::{Service, ServiceId};
pub use repository::ServiceCatalog;
