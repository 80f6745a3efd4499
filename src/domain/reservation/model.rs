//! Reservation domain entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::{self, LifecycleAction};
use crate::domain::catalog::ServiceId;
use crate::domain::identity::CustomerId;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(Uuid);

impl ReservationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ReservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ReservationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for ReservationId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| DomainError::reservation_not_found(s))
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Inserted by an administrator, awaiting confirmation
    Pending,
    /// Booked and expected to take place
    Confirmed,
    /// Withdrawn by the customer or an administrator
    Cancelled,
    /// Service was delivered
    Completed,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Cancelled,
        Self::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Active reservations hold their time window
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::Validation(format!(
                "Unknown reservation status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer-selected calendar date and wall-clock time.
///
/// The wall clock is read in a fixed UTC offset chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Schedule {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// UTC instant of the wall-clock time; `MissingSchedule` when the
    /// date lies at the edge of the calendar and cannot be shifted to UTC
    pub fn start_in(&self, offset: FixedOffset) -> DomainResult<DateTime<Utc>> {
        let local = self.date.and_time(self.time);
        let utc = local
            .checked_sub_signed(Duration::seconds(offset.local_minus_utc() as i64))
            .ok_or_else(|| {
                DomainError::MissingSchedule(format!("{} {} is out of range", self.date, self.time))
            })?;
        Ok(Utc.from_utc_datetime(&utc))
    }
}

/// Half-open interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> DomainResult<Self> {
        if length <= Duration::zero() {
            return Err(DomainError::Validation(format!(
                "Reservation length must be positive, got {} minutes",
                length.num_minutes()
            )));
        }
        let end = start.checked_add_signed(length).ok_or_else(|| {
            DomainError::MissingSchedule(format!(
                "{} plus {} minutes is out of range",
                start,
                length.num_minutes()
            ))
        })?;
        Ok(Self { start, end })
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A reservation that has been computed but not yet stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub customer_id: CustomerId,
    pub service_id: ServiceId,
    pub window: TimeWindow,
    pub status: ReservationStatus,
    pub total_price: Decimal,
    pub notes: Option<String>,
}

/// Time-boxed commitment to perform one service for one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub customer_id: CustomerId,
    pub service_id: ServiceId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    /// Price captured at creation; never recomputed from the catalog
    pub total_price: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn from_draft(draft: ReservationDraft) -> Self {
        let now = Utc::now();
        Self {
            id: ReservationId::new(),
            customer_id: draft.customer_id,
            service_id: draft.service_id,
            start_time: draft.window.start,
            end_time: draft.window.end,
            status: draft.status,
            total_price: draft.total_price,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Move to a new window. `confirm` re-confirms a pending booking.
    pub fn reschedule(&mut self, window: TimeWindow, confirm: bool) -> DomainResult<()> {
        lifecycle::next_status(self.status, LifecycleAction::Reschedule)?;
        self.start_time = window.start;
        self.end_time = window.end;
        if confirm && self.status == ReservationStatus::Pending {
            self.status = ReservationStatus::Confirmed;
        }
        self.touch();
        Ok(())
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        self.apply(LifecycleAction::Cancel)
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        self.apply(LifecycleAction::Complete)
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        self.apply(LifecycleAction::Confirm)
    }

    /// Two active reservations of the same customer and service may not share time
    pub fn conflicts_with(&self, other: &Reservation) -> bool {
        self.id != other.id
            && self.status.is_active()
            && other.status.is_active()
            && self.customer_id == other.customer_id
            && self.service_id == other.service_id
            && self.window().overlaps(&other.window())
    }

    fn apply(&mut self, action: LifecycleAction) -> DomainResult<()> {
        self.status = lifecycle::next_status(self.status, action)?;
        self.touch();
        Ok(())
    }

    /// `updated_at` doubles as the record version, so it must always move forward
    fn touch(&mut self) {
        let next = self.updated_at + Duration::microseconds(1);
        self.updated_at = Utc::now().max(next);
    }
}

/// Query over the reservation store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub customer_id: Option<CustomerId>,
    /// Empty means any status
    pub statuses: Vec<ReservationStatus>,
    pub starts_from: Option<DateTime<Utc>>,
    pub starts_before: Option<DateTime<Utc>>,
}

impl ReservationFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    pub fn starting_between(
        mut self,
        from: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Self {
        self.starts_from = from;
        self.starts_before = before;
        self
    }

    pub fn matches(&self, r: &Reservation) -> bool {
        self.customer_id.as_ref().map_or(true, |c| &r.customer_id == c)
            && (self.statuses.is_empty() || self.statuses.contains(&r.status))
            && self.starts_from.map_or(true, |from| r.start_time >= from)
            && self.starts_before.map_or(true, |before| r.start_time < before)
    }
}

/// Active reservations that have not started yet
pub fn upcoming(reservations: &[Reservation], now: DateTime<Utc>) -> Vec<&Reservation> {
    reservations
        .iter()
        .filter(|r| r.status.is_active() && r.start_time >= now)
        .collect()
}

/// Everything already finished, withdrawn, or in the past
pub fn past(reservations: &[Reservation], now: DateTime<Utc>) -> Vec<&Reservation> {
    reservations
        .iter()
        .filter(|r| r.status.is_terminal() || r.start_time < now)
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ErrorKind;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn sample(status: ReservationStatus) -> Reservation {
        Reservation::from_draft(ReservationDraft {
            customer_id: CustomerId::from("u-1"),
            service_id: ServiceId::from("1"),
            window: TimeWindow::starting_at(at(10, 30), Duration::minutes(45)).unwrap(),
            status,
            total_price: Decimal::from(3000),
            notes: Some("Quantity: 2".into()),
        })
    }

    #[test]
    fn schedule_reads_wall_clock_in_offset() {
        let schedule = Schedule::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        );
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(schedule.start_in(utc).unwrap(), at(10, 30));

        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(schedule.start_in(ist).unwrap(), at(5, 0));
    }

    #[test]
    fn window_rejects_non_positive_length() {
        assert!(TimeWindow::starting_at(at(9, 0), Duration::zero()).is_err());
        let w = TimeWindow::starting_at(at(9, 0), Duration::minutes(30)).unwrap();
        assert_eq!(w.end, at(9, 30));
        assert_eq!(w.length(), Duration::minutes(30));
    }

    #[test]
    fn calendar_edges_are_rejected_not_wrapped() {
        let last = Schedule::new(NaiveDate::MAX, NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        let start = last.start_in(FixedOffset::east_opt(0).unwrap()).unwrap();
        let err = TimeWindow::starting_at(start, Duration::minutes(45)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingSchedule);

        let west = FixedOffset::west_opt(3600).unwrap();
        assert_eq!(last.start_in(west).unwrap_err().kind(), ErrorKind::MissingSchedule);

        let first = Schedule::new(NaiveDate::MIN, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let east = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(first.start_in(east).unwrap_err().kind(), ErrorKind::MissingSchedule);
    }

    #[test]
    fn every_change_moves_the_version_forward() {
        let mut r = sample(ReservationStatus::Pending);
        let created = r.updated_at;
        r.confirm().unwrap();
        let confirmed = r.updated_at;
        assert!(confirmed > created);
        r.cancel().unwrap();
        assert!(r.updated_at > confirmed);
    }

    #[test]
    fn windows_are_half_open() {
        let a = TimeWindow::starting_at(at(9, 0), Duration::minutes(60)).unwrap();
        let b = TimeWindow::starting_at(at(10, 0), Duration::minutes(60)).unwrap();
        let c = TimeWindow::starting_at(at(9, 59), Duration::minutes(5)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn new_reservation_freezes_window_and_price() {
        let r = sample(ReservationStatus::Confirmed);
        assert_eq!(r.start_time, at(10, 30));
        assert_eq!(r.end_time, at(11, 15));
        assert_eq!(r.total_price, Decimal::from(3000));
        assert_eq!(r.created_at, r.updated_at);
    }

    #[test]
    fn cancel_and_complete_are_terminal() {
        let mut r = sample(ReservationStatus::Confirmed);
        r.cancel().unwrap();
        assert_eq!(r.status, ReservationStatus::Cancelled);
        assert_eq!(r.cancel().unwrap_err().kind(), ErrorKind::InvalidTransition);

        let mut r = sample(ReservationStatus::Pending);
        r.complete().unwrap();
        assert_eq!(r.status, ReservationStatus::Completed);
        let before = r.clone();
        let w = TimeWindow::starting_at(at(14, 0), Duration::minutes(30)).unwrap();
        assert_eq!(r.reschedule(w, false).unwrap_err().kind(), ErrorKind::InvalidTransition);
        assert_eq!(r, before);
    }

    #[test]
    fn reschedule_keeps_or_confirms_status() {
        let w = TimeWindow::starting_at(at(14, 0), Duration::minutes(30)).unwrap();

        let mut r = sample(ReservationStatus::Pending);
        r.reschedule(w, false).unwrap();
        assert_eq!(r.status, ReservationStatus::Pending);
        assert_eq!(r.window(), w);

        let mut r = sample(ReservationStatus::Pending);
        r.reschedule(w, true).unwrap();
        assert_eq!(r.status, ReservationStatus::Confirmed);
    }

    #[test]
    fn conflicts_only_between_active_same_resource() {
        let a = sample(ReservationStatus::Confirmed);
        let mut b = sample(ReservationStatus::Confirmed);
        assert!(a.conflicts_with(&b));
        assert!(!a.conflicts_with(&a));

        b.service_id = ServiceId::from("2");
        assert!(!a.conflicts_with(&b));

        let mut c = sample(ReservationStatus::Confirmed);
        c.cancel().unwrap();
        assert!(!a.conflicts_with(&c));

        let mut d = sample(ReservationStatus::Confirmed);
        d.customer_id = CustomerId::from("u-2");
        assert!(!a.conflicts_with(&d));
    }

    #[test]
    fn status_parses_database_values() {
        for status in ReservationStatus::ALL {
            assert_eq!(status.as_str().parse::<ReservationStatus>().unwrap(), status);
        }
        assert_eq!("canceled".parse::<ReservationStatus>().unwrap(), ReservationStatus::Cancelled);
        assert!("upcoming".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn filter_matches_customer_status_and_range() {
        let r = sample(ReservationStatus::Confirmed);

        assert!(ReservationFilter::all().matches(&r));
        assert!(ReservationFilter::for_customer(CustomerId::from("u-1")).matches(&r));
        assert!(!ReservationFilter::for_customer(CustomerId::from("u-2")).matches(&r));
        assert!(!ReservationFilter::all()
            .with_status(ReservationStatus::Pending)
            .matches(&r));
        assert!(ReservationFilter::all()
            .with_status(ReservationStatus::Pending)
            .with_status(ReservationStatus::Confirmed)
            .matches(&r));
        assert!(ReservationFilter::all()
            .starting_between(Some(at(10, 30)), Some(at(10, 31)))
            .matches(&r));
        assert!(!ReservationFilter::all()
            .starting_between(None, Some(at(10, 30)))
            .matches(&r));
    }

    #[test]
    fn upcoming_and_past_split() {
        let future = sample(ReservationStatus::Confirmed);
        let mut done = sample(ReservationStatus::Confirmed);
        done.complete().unwrap();
        let all = vec![future.clone(), done.clone()];

        let now = at(8, 0);
        assert_eq!(upcoming(&all, now), vec![&future]);
        assert_eq!(past(&all, now), vec![&done]);

        let later = at(12, 0);
        assert!(upcoming(&all, later).is_empty());
        assert_eq!(past(&all, later).len(), 2);
    }

    #[test]
    fn reservation_id_parses_uuid() {
        let id = ReservationId::new();
        assert_eq!(id.to_string().parse::<ReservationId>().unwrap(), id);
        assert_eq!(
            "not-a-uuid".parse::<ReservationId>().unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
