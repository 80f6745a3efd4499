//! Catalog service entity

use std::fmt;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stable catalog identifier carried from catalog to cart line to reservation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A bookable, time-boxed service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub title: String,
    pub category: String,
    /// Unit price, never negative
    pub price: Decimal,
    /// Length of one booking in minutes. Rows with a missing or
    /// non-positive value are tolerated and fall back at booking time.
    pub duration_minutes: Option<i32>,
    /// Inactive services can no longer be booked
    pub active: bool,
}

impl Service {
    pub fn new(
        id: impl Into<ServiceId>,
        title: impl Into<String>,
        price: Decimal,
        duration_minutes: i32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: "general".to_string(),
            price,
            duration_minutes: Some(duration_minutes),
            active: true,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Booking length, only when the catalog carries a usable one
    pub fn duration(&self) -> Option<Duration> {
        self.duration_minutes
            .filter(|m| *m > 0)
            .map(|m| Duration::minutes(m as i64))
    }
}
