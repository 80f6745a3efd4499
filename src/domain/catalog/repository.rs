//! Catalog lookup interface

use async_trait::async_trait;

use super::model::{Service, ServiceId};
use crate::domain::DomainResult;

#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// Find service by its stable identifier
    async fn find_by_id(&self, id: &ServiceId) -> DomainResult<Option<Service>>;

    /// Find service by exact display title
    async fn find_by_title(&self, title: &str) -> DomainResult<Option<Service>>;

    /// List all services, active or not
    async fn list(&self) -> DomainResult<Vec<Service>>;

    /// Resolve by identifier first, then by title.
    ///
    /// Checkout never uses the title path; it exists for callers that only
    /// hold a display name.
    async fn resolve_service(&self, id_or_title: &str) -> DomainResult<Option<Service>> {
        if let Some(service) = self.find_by_id(&ServiceId::from(id_or_title)).await? {
            return Ok(Some(service));
        }
        self.find_by_title(id_or_title).await
    }
}
