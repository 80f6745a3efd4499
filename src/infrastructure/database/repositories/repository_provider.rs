//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::catalog::ServiceCatalog;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;

use super::reservation_repository::SeaOrmReservationRepository;
use super::service_repository::SeaOrmServiceRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone(), true);
/// let svc = repos.catalog().find_by_id(&ServiceId::from("1")).await?;
/// let mine = repos.reservations().query(&ReservationFilter::for_customer(id)).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    services: SeaOrmServiceRepository,
    reservations: SeaOrmReservationRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection, enforce_overlap: bool) -> Self {
        Self {
            services: SeaOrmServiceRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db, enforce_overlap),
        }
    }

    /// Concrete catalog repository, for seeding
    pub fn services(&self) -> &SeaOrmServiceRepository {
        &self.services
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn catalog(&self) -> &dyn ServiceCatalog {
        &self.services
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }
}
