use crate::{
    db::DbPool,
    entities::{service_part_usage, sparepart, sparepart_purchase_item},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Service for the spare-part catalog.
#[derive(Clone)]
pub struct SparepartService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSparepartInput {
    pub name: String,
    pub part_no: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub minimum_stock: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSparepartInput {
    pub name: Option<String>,
    pub part_no: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub minimum_stock: Option<i32>,
}

impl SparepartService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_sparepart(
        &self,
        input: CreateSparepartInput,
        actor: Uuid,
    ) -> Result<sparepart::Model, ServiceError> {
        self.ensure_unique_name(&input.name, None).await?;

        if let Some(min) = input.minimum_stock {
            if min < 0 {
                return Err(ServiceError::ValidationError(
                    "minimum_stock cannot be negative".into(),
                ));
            }
        }

        let model = sparepart::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            part_no: Set(input.part_no),
            unit: Set(input.unit),
            description: Set(input.description),
            minimum_stock: Set(input.minimum_stock),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::SparepartCreated(created.id))
            .await;

        info!("Created spare part: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_sparepart(
        &self,
        sparepart_id: Uuid,
        input: UpdateSparepartInput,
        actor: Uuid,
    ) -> Result<sparepart::Model, ServiceError> {
        let existing = self.get_sparepart(sparepart_id).await?;

        if let Some(ref name) = input.name {
            self.ensure_unique_name(name, Some(sparepart_id)).await?;
        }
        if let Some(min) = input.minimum_stock {
            if min < 0 {
                return Err(ServiceError::ValidationError(
                    "minimum_stock cannot be negative".into(),
                ));
            }
        }

        let mut active: sparepart::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(part_no) = input.part_no {
            active.part_no = Set(Some(part_no));
        }
        if let Some(unit) = input.unit {
            active.unit = Set(Some(unit));
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(minimum_stock) = input.minimum_stock {
            active.minimum_stock = Set(Some(minimum_stock));
        }
        active.updated_by = Set(Some(actor));

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::SparepartUpdated(sparepart_id))
            .await;

        Ok(updated)
    }

    /// Soft-delete a spare part; parts referenced by purchase items or
    /// service usage keep their history but the part itself cannot be
    /// removed while live references exist.
    #[instrument(skip(self))]
    pub async fn delete_sparepart(
        &self,
        sparepart_id: Uuid,
        actor: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = self.get_sparepart(sparepart_id).await?;

        let live_purchase_items = sparepart_purchase_item::Entity::find()
            .filter(sparepart_purchase_item::Column::SparepartId.eq(sparepart_id))
            .filter(sparepart_purchase_item::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if live_purchase_items > 0 {
            return Err(ServiceError::Conflict(format!(
                "Spare part {} is referenced by {} purchase item(s)",
                sparepart_id, live_purchase_items
            )));
        }

        let live_usages = service_part_usage::Entity::find()
            .filter(service_part_usage::Column::SparepartId.eq(sparepart_id))
            .filter(service_part_usage::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if live_usages > 0 {
            return Err(ServiceError::Conflict(format!(
                "Spare part {} is referenced by {} service usage record(s)",
                sparepart_id, live_usages
            )));
        }

        let mut active: sparepart::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.deleted_by = Set(Some(actor));
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::SparepartDeleted(sparepart_id))
            .await;

        info!("Soft-deleted spare part: {}", sparepart_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_sparepart(&self, sparepart_id: Uuid) -> Result<sparepart::Model, ServiceError> {
        sparepart::Entity::find_by_id(sparepart_id)
            .filter(sparepart::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Spare part with ID {} not found", sparepart_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_spareparts(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<(Vec<sparepart::Model>, u64), ServiceError> {
        let mut query = sparepart::Entity::find()
            .filter(sparepart::Column::DeletedAt.is_null())
            .order_by_asc(sparepart::Column::Name);

        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query = query.filter(sparepart::Column::Name.contains(term.trim()));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn ensure_unique_name(
        &self,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = sparepart::Entity::find()
            .filter(sparepart::Column::Name.eq(name.trim()))
            .filter(sparepart::Column::DeletedAt.is_null());
        if let Some(id) = exclude_id {
            query = query.filter(sparepart::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Spare part name '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }
}
