//! Identity types and the authentication context seam

pub mod model;

pub use model::{Actor, AuthContext, CustomerId, Role, StaticAuthContext};
