//! Reservation builder: cart line + schedule -> reservation draft

use chrono::{Duration, FixedOffset, Offset, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::{
    CartLine, CustomerId, DomainError, DomainResult, ReservationDraft, ReservationStatus,
    Schedule, Service, ServiceCatalog, ServiceId, TimeWindow,
};

/// Fallback when a catalog row has no usable duration
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// Turns resolved services into time-boxed drafts
#[derive(Debug, Clone, Copy)]
pub struct ReservationBuilder {
    default_duration: Duration,
    offset: FixedOffset,
}

impl ReservationBuilder {
    pub fn new(default_duration_minutes: i64, offset: FixedOffset) -> Self {
        Self {
            default_duration: Duration::minutes(default_duration_minutes.max(1)),
            offset,
        }
    }

    /// Offset in which customer wall-clock schedules are read
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Catalog duration, or the fallback (logged) when it is missing or non-positive
    pub fn duration_for(&self, service: &Service) -> Duration {
        match service.duration() {
            Some(d) => d,
            None => {
                warn!(
                    service_id = %service.id,
                    duration_minutes = ?service.duration_minutes,
                    fallback_minutes = self.default_duration.num_minutes(),
                    "Service has no positive duration, using fallback"
                );
                self.default_duration
            }
        }
    }

    /// Window for `service` starting at the schedule's wall-clock time
    pub fn window(&self, service: Option<&Service>, schedule: &Schedule) -> DomainResult<TimeWindow> {
        let length = match service {
            Some(s) => self.duration_for(s),
            None => {
                warn!(
                    fallback_minutes = self.default_duration.num_minutes(),
                    "Service no longer in catalog, using fallback duration"
                );
                self.default_duration
            }
        };
        TimeWindow::starting_at(schedule.start_in(self.offset)?, length)
    }

    /// Draft for an already-resolved, bookable service
    pub fn draft(
        &self,
        customer_id: &CustomerId,
        service: &Service,
        quantity: u32,
        schedule: &Schedule,
        status: ReservationStatus,
    ) -> DomainResult<ReservationDraft> {
        if quantity == 0 {
            return Err(DomainError::Validation("Quantity must be at least 1".into()));
        }
        Ok(ReservationDraft {
            customer_id: customer_id.clone(),
            service_id: service.id.clone(),
            window: self.window(Some(service), schedule)?,
            status,
            total_price: service.price * Decimal::from(quantity),
            notes: Some(format!("Quantity: {}", quantity)),
        })
    }

    /// Resolve a service by id; missing, inactive or unreachable is `ServiceUnavailable`
    pub async fn resolve(
        &self,
        catalog: &dyn ServiceCatalog,
        service_id: &ServiceId,
        label: &str,
    ) -> DomainResult<Service> {
        match catalog.find_by_id(service_id).await {
            Ok(Some(service)) if service.active => Ok(service),
            Ok(Some(_)) => Err(DomainError::ServiceUnavailable(format!(
                "{} is no longer offered",
                label
            ))),
            Ok(None) => Err(DomainError::ServiceUnavailable(format!(
                "{} is not in the catalog",
                label
            ))),
            Err(e) => {
                warn!(service_id = %service_id, error = %e, "Catalog lookup failed");
                Err(DomainError::ServiceUnavailable(format!(
                    "{} could not be looked up",
                    label
                )))
            }
        }
    }

    /// Confirmed draft for one cart line
    pub async fn build(
        &self,
        catalog: &dyn ServiceCatalog,
        customer_id: &CustomerId,
        line: &CartLine,
        schedule: &Schedule,
    ) -> DomainResult<ReservationDraft> {
        let service = self
            .resolve(catalog, &line.service.id, &line.service.title)
            .await?;
        self.draft(
            customer_id,
            &service,
            line.quantity,
            schedule,
            ReservationStatus::Confirmed,
        )
    }
}

impl Default for ReservationBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MINUTES, Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryServiceCatalog;
    use crate::shared::ErrorKind;
    use chrono::{NaiveDate, NaiveTime, TimeZone};

    fn schedule(h: u32, m: u32) -> Schedule {
        Schedule::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        )
    }

    fn line(service: Service, quantity: u32) -> CartLine {
        CartLine { service, quantity }
    }

    #[tokio::test]
    async fn builds_confirmed_draft_from_catalog_row() {
        let mowing = Service::new("1", "Lawn Mowing", Decimal::from(1500), 45);
        let catalog = InMemoryServiceCatalog::with_services([mowing.clone()]);
        let builder = ReservationBuilder::default();

        let draft = builder
            .build(&catalog, &CustomerId::from("u-1"), &line(mowing, 2), &schedule(10, 30))
            .await
            .unwrap();

        assert_eq!(draft.window.start, Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap());
        assert_eq!(draft.window.end, Utc.with_ymd_and_hms(2025, 3, 1, 11, 15, 0).unwrap());
        assert_eq!(draft.total_price, Decimal::from(3000));
        assert_eq!(draft.status, ReservationStatus::Confirmed);
        assert_eq!(draft.notes.as_deref(), Some("Quantity: 2"));
    }

    #[tokio::test]
    async fn price_and_duration_come_from_catalog_not_cart() {
        let stale = Service::new("1", "Lawn Mowing", Decimal::from(1000), 30);
        let current = Service::new("1", "Lawn Mowing", Decimal::from(1500), 45);
        let catalog = InMemoryServiceCatalog::with_services([current]);

        let draft = ReservationBuilder::default()
            .build(&catalog, &CustomerId::from("u-1"), &line(stale, 1), &schedule(9, 0))
            .await
            .unwrap();
        assert_eq!(draft.total_price, Decimal::from(1500));
        assert_eq!(draft.window.length(), Duration::minutes(45));
    }

    #[tokio::test]
    async fn missing_duration_falls_back_to_an_hour() {
        let mut odd = Service::new("7", "Leaf Blowing", Decimal::from(800), 0);
        let catalog = InMemoryServiceCatalog::with_services([odd.clone()]);
        let builder = ReservationBuilder::default();

        let draft = builder
            .build(&catalog, &CustomerId::from("u-1"), &line(odd.clone(), 1), &schedule(9, 0))
            .await
            .unwrap();
        assert_eq!(draft.window.length(), Duration::minutes(60));

        odd.duration_minutes = None;
        assert_eq!(builder.duration_for(&odd), Duration::minutes(60));
    }

    #[tokio::test]
    async fn unknown_or_inactive_service_is_unavailable() {
        let retired = Service::new("5", "Tree Felling", Decimal::from(9000), 240).deactivated();
        let catalog = InMemoryServiceCatalog::with_services([retired.clone()]);
        let builder = ReservationBuilder::default();
        let customer = CustomerId::from("u-1");

        let err = builder
            .build(&catalog, &customer, &line(retired, 1), &schedule(9, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);

        let ghost = Service::new("404", "Pond Cleaning", Decimal::from(100), 30);
        let err = builder
            .build(&catalog, &customer, &line(ghost, 1), &schedule(9, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(err.to_string().contains("Pond Cleaning"));
    }

    #[test]
    fn schedule_is_read_in_configured_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let builder = ReservationBuilder::new(60, plus_two);
        let svc = Service::new("1", "Lawn Mowing", Decimal::from(1500), 45);

        let window = builder.window(Some(&svc), &schedule(10, 30)).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 1, 9, 15, 0).unwrap());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let svc = Service::new("1", "Lawn Mowing", Decimal::from(1500), 45);
        let err = ReservationBuilder::default()
            .draft(&CustomerId::from("u-1"), &svc, 0, &schedule(9, 0), ReservationStatus::Pending)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
