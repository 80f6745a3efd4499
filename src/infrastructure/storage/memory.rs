//! In-memory storage implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::reservation::stale_write;
use crate::domain::{
    CustomerId, DomainError, DomainResult, RepositoryProvider, Reservation, ReservationFilter,
    ReservationId, ReservationRepository, Service, ServiceCatalog, ServiceId,
};

/// In-memory catalog for development and testing
#[derive(Default)]
pub struct InMemoryServiceCatalog {
    services: DashMap<ServiceId, Service>,
}

impl InMemoryServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(services: impl IntoIterator<Item = Service>) -> Self {
        let catalog = Self::new();
        for service in services {
            catalog.upsert(service);
        }
        catalog
    }

    /// Insert or replace a catalog row (seeding and price/duration changes)
    pub fn upsert(&self, service: Service) {
        self.services.insert(service.id.clone(), service);
    }

    pub fn remove(&self, id: &ServiceId) {
        self.services.remove(id);
    }
}

#[async_trait]
impl ServiceCatalog for InMemoryServiceCatalog {
    async fn find_by_id(&self, id: &ServiceId) -> DomainResult<Option<Service>> {
        Ok(self.services.get(id).map(|s| s.clone()))
    }

    async fn find_by_title(&self, title: &str) -> DomainResult<Option<Service>> {
        Ok(self
            .services
            .iter()
            .filter(|s| s.title == title)
            .min_by(|a, b| a.id.cmp(&b.id))
            .map(|s| s.clone()))
    }

    async fn list(&self) -> DomainResult<Vec<Service>> {
        let mut services: Vec<Service> = self.services.iter().map(|s| s.clone()).collect();
        services.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(services)
    }
}

/// In-memory reservation store with per-resource write locks
pub struct InMemoryReservationRepository {
    reservations: DashMap<ReservationId, Reservation>,
    slot_locks: DashMap<SlotKey, Arc<Mutex<()>>>,
    enforce_overlap: bool,
}

type SlotKey = (CustomerId, ServiceId);

fn slot_key(r: &Reservation) -> SlotKey {
    (r.customer_id.clone(), r.service_id.clone())
}

impl InMemoryReservationRepository {
    pub fn new(enforce_overlap: bool) -> Self {
        Self {
            reservations: DashMap::new(),
            slot_locks: DashMap::new(),
            enforce_overlap,
        }
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Run `write` while holding the lock for `key`.
    ///
    /// The lock entry is dropped again once nobody else holds or waits on it.
    async fn with_slot<T>(
        &self,
        key: SlotKey,
        write: impl FnOnce() -> DomainResult<T> + Send,
    ) -> DomainResult<T> {
        let lock = self.slot_locks.entry(key.clone()).or_default().clone();
        let outcome = {
            let _guard = lock.lock().await;
            write()
        };
        drop(lock);
        self.slot_locks.remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        outcome
    }

    fn check_overlap(&self, candidate: &Reservation) -> DomainResult<()> {
        if !self.enforce_overlap {
            return Ok(());
        }
        if let Some(other) = self
            .reservations
            .iter()
            .find(|e| candidate.conflicts_with(e.value()))
        {
            return Err(DomainError::Conflict(format!(
                "{} already holds {} from {} to {}",
                other.id, other.service_id, other.start_time, other.end_time
            )));
        }
        Ok(())
    }

    fn store_new(&self, reservation: Reservation) -> DomainResult<ReservationId> {
        if self.reservations.contains_key(&reservation.id) {
            return Err(DomainError::Conflict(format!(
                "reservation {} already exists",
                reservation.id
            )));
        }
        self.check_overlap(&reservation)?;

        let id = reservation.id;
        self.reservations.insert(id, reservation);
        Ok(id)
    }

    fn replace(&self, reservation: Reservation, expected: DateTime<Utc>) -> DomainResult<()> {
        let id = reservation.id;
        match self.reservations.get(&id) {
            Some(stored) if stored.updated_at == expected => {}
            stored => return Err(stale_write(stored.as_deref(), &id)),
        }
        self.check_overlap(&reservation)?;

        // delete does not take the slot lock, so look again
        match self.reservations.get_mut(&id) {
            Some(mut stored) if stored.updated_at == expected => {
                *stored = reservation;
                Ok(())
            }
            stored => Err(stale_write(stored.as_deref(), &id)),
        }
    }
}

impl Default for InMemoryReservationRepository {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn insert(&self, reservation: Reservation) -> DomainResult<ReservationId> {
        let key = slot_key(&reservation);
        self.with_slot(key, || self.store_new(reservation)).await
    }

    async fn find_by_id(&self, id: &ReservationId) -> DomainResult<Option<Reservation>> {
        Ok(self.reservations.get(id).map(|r| r.clone()))
    }

    async fn update(&self, reservation: Reservation, expected: DateTime<Utc>) -> DomainResult<()> {
        let key = slot_key(&reservation);
        self.with_slot(key, || self.replace(reservation, expected)).await
    }

    async fn delete(&self, id: &ReservationId) -> DomainResult<()> {
        self.reservations
            .remove(id)
            .ok_or_else(|| DomainError::reservation_not_found(id))?;
        Ok(())
    }

    async fn query(&self, filter: &ReservationFilter) -> DomainResult<Vec<Reservation>> {
        let mut found: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.clone())
            .collect();
        found.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(found)
    }
}

/// Repository provider backed by process memory
pub struct InMemoryRepositoryProvider {
    catalog: InMemoryServiceCatalog,
    reservations: InMemoryReservationRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new(enforce_overlap: bool) -> Self {
        Self {
            catalog: InMemoryServiceCatalog::new(),
            reservations: InMemoryReservationRepository::new(enforce_overlap),
        }
    }

    pub fn with_services(services: impl IntoIterator<Item = Service>) -> Self {
        Self {
            catalog: InMemoryServiceCatalog::with_services(services),
            reservations: InMemoryReservationRepository::default(),
        }
    }

    pub fn catalog_store(&self) -> &InMemoryServiceCatalog {
        &self.catalog
    }

    pub fn reservation_store(&self) -> &InMemoryReservationRepository {
        &self.reservations
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn catalog(&self) -> &dyn ServiceCatalog {
        &self.catalog
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReservationDraft, ReservationStatus, TimeWindow};
    use crate::shared::ErrorKind;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn draft(customer: &str, service: &str, hour: u32, minutes: i64) -> Reservation {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap();
        Reservation::from_draft(ReservationDraft {
            customer_id: CustomerId::from(customer),
            service_id: ServiceId::from(service),
            window: TimeWindow::starting_at(start, Duration::minutes(minutes)).unwrap(),
            status: ReservationStatus::Confirmed,
            total_price: Decimal::from(1500),
            notes: None,
        })
    }

    #[tokio::test]
    async fn catalog_lookup_by_id_and_title() {
        let catalog = InMemoryServiceCatalog::with_services([
            Service::new("1", "Lawn Mowing", Decimal::from(1500), 45),
            Service::new("4", "Lawn Mowing", Decimal::from(45), 30),
            Service::new("2", "Garden Weeding", Decimal::from(1200), 60),
        ]);

        let by_id = catalog.find_by_id(&ServiceId::from("2")).await.unwrap().unwrap();
        assert_eq!(by_id.title, "Garden Weeding");

        // duplicate titles resolve deterministically
        let by_title = catalog.find_by_title("Lawn Mowing").await.unwrap().unwrap();
        assert_eq!(by_title.id, ServiceId::from("1"));

        let resolved = catalog.resolve_service("Garden Weeding").await.unwrap().unwrap();
        assert_eq!(resolved.id, ServiceId::from("2"));
        assert!(catalog.resolve_service("Tree Felling").await.unwrap().is_none());

        let ids: Vec<_> = catalog.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![ServiceId::from("1"), ServiceId::from("2"), ServiceId::from("4")]);
    }

    #[tokio::test]
    async fn insert_find_update_delete() {
        let repo = InMemoryReservationRepository::default();
        let mut r = draft("alice", "1", 10, 60);
        let id = repo.insert(r.clone()).await.unwrap();
        assert_eq!(repo.find_by_id(&id).await.unwrap(), Some(r.clone()));

        let version = r.updated_at;
        r.cancel().unwrap();
        repo.update(r.clone(), version).await.unwrap();
        assert_eq!(
            repo.find_by_id(&id).await.unwrap().unwrap().status,
            ReservationStatus::Cancelled
        );

        repo.delete(&id).await.unwrap();
        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        assert_eq!(repo.delete(&id).await.unwrap_err().kind(), ErrorKind::NotFound);
        let version = r.updated_at;
        assert_eq!(repo.update(r, version).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert!(repo.slot_locks.is_empty());
    }

    #[tokio::test]
    async fn update_from_an_outdated_read_is_refused() {
        let repo = InMemoryReservationRepository::default();
        let original = draft("alice", "1", 10, 60);
        repo.insert(original.clone()).await.unwrap();

        let mut moved = original.clone();
        moved
            .reschedule(
                TimeWindow::starting_at(original.start_time + Duration::hours(3), Duration::minutes(60))
                    .unwrap(),
                true,
            )
            .unwrap();
        repo.update(moved.clone(), original.updated_at).await.unwrap();

        // a second writer still holding the original read
        let mut cancelled = original.clone();
        cancelled.cancel().unwrap();
        let err = repo.update(cancelled, original.updated_at).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let stored = repo.find_by_id(&original.id).await.unwrap().unwrap();
        assert_eq!(stored, moved);
    }

    #[tokio::test]
    async fn terminal_record_is_not_overwritten() {
        let repo = InMemoryReservationRepository::default();
        let original = draft("alice", "1", 10, 60);
        repo.insert(original.clone()).await.unwrap();

        let mut cancelled = original.clone();
        cancelled.cancel().unwrap();
        repo.update(cancelled.clone(), original.updated_at).await.unwrap();

        let mut completed = original.clone();
        completed.complete().unwrap();
        let err = repo.update(completed, original.updated_at).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(err.to_string(), "Cannot change a reservation that is cancelled");
        assert_eq!(
            repo.find_by_id(&original.id).await.unwrap().unwrap().status,
            ReservationStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn slot_locks_are_released_after_concurrent_writes() {
        let repo = Arc::new(InMemoryReservationRepository::default());
        let handles: Vec<_> = (0..8)
            .map(|hour| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.insert(draft("alice", "1", 8 + hour, 60)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(repo.len(), 8);
        assert!(repo.slot_locks.is_empty());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let repo = InMemoryReservationRepository::new(false);
        let r = draft("alice", "1", 10, 60);
        repo.insert(r.clone()).await.unwrap();
        assert_eq!(repo.insert(r).await.unwrap_err().kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn overlapping_window_for_same_resource_is_rejected() {
        let repo = InMemoryReservationRepository::default();
        repo.insert(draft("alice", "1", 10, 60)).await.unwrap();

        let clash = draft("alice", "1", 10, 30);
        assert_eq!(repo.insert(clash).await.unwrap_err().kind(), ErrorKind::Conflict);

        // other service, other customer, adjacent slot are all fine
        repo.insert(draft("alice", "2", 10, 60)).await.unwrap();
        repo.insert(draft("bob", "1", 10, 60)).await.unwrap();
        repo.insert(draft("alice", "1", 11, 60)).await.unwrap();
        assert_eq!(repo.len(), 4);
    }

    #[tokio::test]
    async fn cancelled_reservation_frees_its_window() {
        let repo = InMemoryReservationRepository::default();
        let mut first = draft("alice", "1", 10, 60);
        repo.insert(first.clone()).await.unwrap();
        let version = first.updated_at;
        first.cancel().unwrap();
        repo.update(first, version).await.unwrap();

        repo.insert(draft("alice", "1", 10, 60)).await.unwrap();
    }

    #[tokio::test]
    async fn overlap_check_can_be_disabled() {
        let repo = InMemoryReservationRepository::new(false);
        repo.insert(draft("alice", "1", 10, 60)).await.unwrap();
        repo.insert(draft("alice", "1", 10, 60)).await.unwrap();
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn query_filters_and_orders_latest_first() {
        let repo = InMemoryReservationRepository::default();
        repo.insert(draft("alice", "1", 9, 60)).await.unwrap();
        repo.insert(draft("alice", "2", 14, 60)).await.unwrap();
        repo.insert(draft("bob", "1", 12, 60)).await.unwrap();

        let all = repo.query(&ReservationFilter::all()).await.unwrap();
        let hours: Vec<_> = all.iter().map(|r| r.start_time.format("%H").to_string()).collect();
        assert_eq!(hours, vec!["14", "12", "09"]);

        let alice = repo
            .query(&ReservationFilter::for_customer(CustomerId::from("alice")))
            .await
            .unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|r| r.customer_id.as_str() == "alice"));
    }
}
