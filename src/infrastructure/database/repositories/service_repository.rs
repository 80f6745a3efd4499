//! SeaORM implementation of ServiceCatalog

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::catalog::{Service, ServiceCatalog, ServiceId};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::service;

pub struct SeaOrmServiceRepository {
    db: DatabaseConnection,
}

impl SeaOrmServiceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert or overwrite a catalog row (configuration seeding)
    pub async fn upsert(&self, s: Service) -> DomainResult<()> {
        debug!("Upserting service: {}", s.id);

        let now = Utc::now();
        let existing = service::Entity::find_by_id(s.id.as_str())
            .one(&self.db)
            .await?;

        match existing {
            Some(row) => {
                let mut active: service::ActiveModel = row.into();
                active.title = Set(s.title);
                active.category = Set(s.category);
                active.price = Set(s.price.to_string());
                active.duration_minutes = Set(s.duration_minutes);
                active.active = Set(s.active);
                active.updated_at = Set(now);
                active.update(&self.db).await?;
            }
            None => {
                let model = service::ActiveModel {
                    id: Set(s.id.as_str().to_string()),
                    title: Set(s.title),
                    category: Set(s.category),
                    price: Set(s.price.to_string()),
                    duration_minutes: Set(s.duration_minutes),
                    active: Set(s.active),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&self.db).await?;
            }
        }
        Ok(())
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: service::Model) -> DomainResult<Service> {
    let price = Decimal::from_str(&m.price).map_err(|e| {
        DomainError::Persistence(format!("Service {} has unreadable price '{}': {}", m.id, m.price, e))
    })?;
    Ok(Service {
        id: ServiceId::from(m.id),
        title: m.title,
        category: m.category,
        price,
        duration_minutes: m.duration_minutes,
        active: m.active,
    })
}

// ── ServiceCatalog impl ─────────────────────────────────────────

#[async_trait]
impl ServiceCatalog for SeaOrmServiceRepository {
    async fn find_by_id(&self, id: &ServiceId) -> DomainResult<Option<Service>> {
        let model = service::Entity::find_by_id(id.as_str())
            .one(&self.db)
            .await?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_title(&self, title: &str) -> DomainResult<Option<Service>> {
        let model = service::Entity::find()
            .filter(service::Column::Title.eq(title))
            .order_by_asc(service::Column::Id)
            .one(&self.db)
            .await?;
        model.map(model_to_domain).transpose()
    }

    async fn list(&self) -> DomainResult<Vec<Service>> {
        let models = service::Entity::find()
            .order_by_asc(service::Column::Id)
            .all(&self.db)
            .await?;
        models.into_iter().map(model_to_domain).collect()
    }
}
