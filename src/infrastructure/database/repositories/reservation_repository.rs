//! SeaORM implementation of ReservationRepository

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::catalog::ServiceId;
use crate::domain::identity::CustomerId;
use crate::domain::reservation::{
    stale_write, Reservation, ReservationFilter, ReservationId, ReservationRepository,
    ReservationStatus,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::reservation;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
    enforce_overlap: bool,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection, enforce_overlap: bool) -> Self {
        Self {
            db,
            enforce_overlap,
        }
    }

    /// Reject `r` if another active booking of the same customer and service overlaps it
    async fn check_overlap<C: ConnectionTrait>(&self, conn: &C, r: &Reservation) -> DomainResult<()> {
        if !self.enforce_overlap || !r.status.is_active() {
            return Ok(());
        }

        let active: Vec<String> = ReservationStatus::ALL
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.as_str().to_string())
            .collect();

        let candidates = reservation::Entity::find()
            .filter(reservation::Column::CustomerId.eq(r.customer_id.as_str()))
            .filter(reservation::Column::ServiceId.eq(r.service_id.as_str()))
            .filter(reservation::Column::Status.is_in(active))
            .filter(reservation::Column::Id.ne(r.id.to_string()))
            .all(conn)
            .await?;

        for model in candidates {
            let other = model_to_domain(model)?;
            if r.conflicts_with(&other) {
                return Err(DomainError::Conflict(format!(
                    "{} already holds {} from {} to {}",
                    other.id, other.service_id, other.start_time, other.end_time
                )));
            }
        }
        Ok(())
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    let id = Uuid::parse_str(&m.id)
        .map_err(|e| DomainError::Persistence(format!("Bad reservation id '{}': {}", m.id, e)))?;
    let status = ReservationStatus::from_str(&m.status)
        .map_err(|e| DomainError::Persistence(format!("Reservation {}: {}", m.id, e)))?;
    let total_price = Decimal::from_str(&m.total_price).map_err(|e| {
        DomainError::Persistence(format!("Reservation {} has unreadable total: {}", m.id, e))
    })?;

    Ok(Reservation {
        id: ReservationId::from(id),
        customer_id: CustomerId::from(m.customer_id),
        service_id: ServiceId::from(m.service_id),
        start_time: m.start_time,
        end_time: m.end_time,
        status,
        total_price,
        notes: m.notes,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(r: Reservation) -> reservation::ActiveModel {
    reservation::ActiveModel {
        id: Set(r.id.to_string()),
        customer_id: Set(r.customer_id.as_str().to_string()),
        service_id: Set(r.service_id.as_str().to_string()),
        start_time: Set(r.start_time),
        end_time: Set(r.end_time),
        status: Set(r.status.as_str().to_string()),
        total_price: Set(r.total_price.to_string()),
        notes: Set(r.notes),
        created_at: Set(r.created_at),
        updated_at: Set(r.updated_at),
    }
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn insert(&self, r: Reservation) -> DomainResult<ReservationId> {
        debug!("Saving reservation: {}", r.id);

        let txn = self.db.begin().await?;

        let existing = reservation::Entity::find_by_id(r.id.to_string())
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(DomainError::Conflict(format!(
                "reservation {} already exists",
                r.id
            )));
        }
        self.check_overlap(&txn, &r).await?;

        let id = r.id;
        domain_to_active(r).insert(&txn).await?;
        txn.commit().await?;
        Ok(id)
    }

    async fn find_by_id(&self, id: &ReservationId) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        model.map(model_to_domain).transpose()
    }

    async fn update(&self, r: Reservation, expected: DateTime<Utc>) -> DomainResult<()> {
        debug!("Updating reservation: {}", r.id);

        let txn = self.db.begin().await?;

        let existing = reservation::Entity::find_by_id(r.id.to_string())
            .one(&txn)
            .await?
            .map(model_to_domain)
            .transpose()?;
        match &existing {
            Some(stored) if stored.updated_at == expected => {}
            stored => return Err(stale_write(stored.as_ref(), &r.id)),
        }
        self.check_overlap(&txn, &r).await?;

        let id = r.id;
        let result = reservation::Entity::update_many()
            .set(domain_to_active(r))
            .filter(reservation::Column::Id.eq(id.to_string()))
            .filter(reservation::Column::UpdatedAt.eq(expected))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            let current = reservation::Entity::find_by_id(id.to_string())
                .one(&txn)
                .await?
                .map(model_to_domain)
                .transpose()?;
            return Err(stale_write(current.as_ref(), &id));
        }
        txn.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &ReservationId) -> DomainResult<()> {
        debug!("Deleting reservation: {}", id);

        let result = reservation::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::reservation_not_found(id));
        }
        Ok(())
    }

    async fn query(&self, filter: &ReservationFilter) -> DomainResult<Vec<Reservation>> {
        let mut select = reservation::Entity::find();
        if let Some(customer_id) = &filter.customer_id {
            select = select.filter(reservation::Column::CustomerId.eq(customer_id.as_str()));
        }
        if !filter.statuses.is_empty() {
            let statuses: Vec<String> = filter
                .statuses
                .iter()
                .map(|s| s.as_str().to_string())
                .collect();
            select = select.filter(reservation::Column::Status.is_in(statuses));
        }
        if let Some(from) = filter.starts_from {
            select = select.filter(reservation::Column::StartTime.gte(from));
        }
        if let Some(before) = filter.starts_before {
            select = select.filter(reservation::Column::StartTime.lt(before));
        }

        select
            .order_by_desc(reservation::Column::StartTime)
            .all(&self.db)
            .await?
            .into_iter()
            .map(model_to_domain)
            .collect()
    }
}
