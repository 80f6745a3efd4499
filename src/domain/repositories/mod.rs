//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to the catalog and reservation store
//! - `DomainResult`: standard result type for domain operations

use super::catalog::ServiceCatalog;
use super::reservation::ReservationRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let svc = repos.catalog().find_by_id(&"1".into()).await?;
///     let mine = repos.reservations().query(&ReservationFilter::for_customer(id)).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn catalog(&self) -> &dyn ServiceCatalog;
    fn reservations(&self) -> &dyn ReservationRepository;
}
