//! Shopping cart staged before checkout

pub mod model;

pub use model::{BillSummary, Cart, CartLine};
