//! Reservation entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reservations")]
pub struct Model {
    /// Hyphenated UUID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub customer_id: String,
    pub service_id: String,

    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,

    /// Reservation status: pending, confirmed, cancelled, completed
    pub status: String,

    /// Decimal total kept as text
    pub total_price: String,

    #[sea_orm(nullable)]
    pub notes: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
