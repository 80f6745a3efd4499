//! Configuration module
//!
//! ```toml
//! [database]
//! url = "sqlite://./booking.db?mode=rwc"
//!
//! [booking]
//! default_duration_minutes = 60
//! utc_offset_minutes = 330
//! service_charge = "200"
//!
//! [auth]
//! admins = ["ops@example.com"]
//!
//! [[catalog]]
//! id = "1"
//! title = "Lawn Mowing"
//! price = "1500"
//! duration_minutes = 45
//! category = "lawn-care"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::application::ReservationBuilder;
use crate::domain::{CustomerId, Service, ServiceId};
use crate::infrastructure::database::{DatabaseConfig, DEFAULT_DATABASE_URL};
use crate::shared::InfraError;

pub const CONFIG_ENV_VAR: &str = "BOOKING_CONFIG";

/// Default config location: `<config_dir>/booking-engine/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("booking-engine")
        .join("config.toml")
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(nested)]
    pub database: DatabaseSection,
    #[validate(nested)]
    pub booking: BookingSection,
    pub logging: LoggingSection,
    pub auth: AuthSection,
    #[validate(nested)]
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseSection {
    #[validate(length(min = 1, message = "database url must not be empty"))]
    pub url: String,
    #[validate(range(min = 1, max = 100))]
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BookingSection {
    /// Used when a catalog row has no positive duration
    #[validate(range(min = 1, max = 1440))]
    pub default_duration_minutes: i64,
    /// Offset in which customers' wall-clock date/time is read
    #[validate(range(min = -840, max = 840))]
    pub utc_offset_minutes: i32,
    /// Flat charge added to a non-empty cart's bill
    #[validate(custom(function = "non_negative"))]
    pub service_charge: Decimal,
    /// Reject overlapping active reservations per customer and service
    pub enforce_overlap: bool,
}

impl Default for BookingSection {
    fn default() -> Self {
        Self {
            default_duration_minutes: 60,
            utc_offset_minutes: 0,
            service_charge: Decimal::from(200),
            enforce_overlap: true,
        }
    }
}

impl BookingSection {
    pub fn offset(&self) -> Result<FixedOffset, InfraError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            InfraError::Config(format!(
                "utc_offset_minutes {} is out of range",
                self.utc_offset_minutes
            ))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Customer ids that carry the admin role claim
    pub admins: Vec<String>,
}

impl AuthSection {
    pub fn admin_ids(&self) -> HashSet<CustomerId> {
        self.admins.iter().map(|a| CustomerId::from(a.trim())).collect()
    }
}

/// One seeded catalog row
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CatalogEntry {
    #[validate(length(min = 1, message = "catalog id must not be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "catalog title must not be empty"))]
    pub title: String,
    #[validate(custom(function = "non_negative"))]
    pub price: Decimal,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_active() -> bool {
    true
}

impl CatalogEntry {
    pub fn to_service(&self) -> Service {
        Service {
            id: ServiceId::from(self.id.as_str()),
            title: self.title.clone(),
            category: self.category.clone(),
            price: self.price,
            duration_minutes: self.duration_minutes,
            active: self.active,
        }
    }
}

impl AppConfig {
    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, InfraError> {
        let config: Self =
            toml::from_str(raw).map_err(|e| InfraError::Config(format!("parse error: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Field rules plus cross-field checks
    pub fn check(&self) -> Result<(), InfraError> {
        self.validate()
            .map_err(|e| InfraError::Config(e.to_string()))?;

        let mut seen = HashSet::new();
        for entry in &self.catalog {
            if !seen.insert(entry.id.as_str()) {
                return Err(InfraError::Config(format!(
                    "catalog id '{}' appears more than once",
                    entry.id
                )));
            }
        }
        Ok(())
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
        }
    }

    pub fn reservation_builder(&self) -> Result<ReservationBuilder, InfraError> {
        Ok(ReservationBuilder::new(
            self.booking.default_duration_minutes,
            self.booking.offset()?,
        ))
    }

    pub fn catalog_services(&self) -> Vec<Service> {
        self.catalog.iter().map(CatalogEntry::to_service).collect()
    }
}
