//! Storage implementations that live in process memory

mod memory;

pub use memory::{InMemoryRepositoryProvider, InMemoryReservationRepository, InMemoryServiceCatalog};
