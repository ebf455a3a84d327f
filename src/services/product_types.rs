use crate::{
    db::DbPool,
    entities::{inventory_unit, product, product_type},
    errors::ServiceError,
    events::EventSender,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Service for product types (variants of a product).
#[derive(Clone)]
pub struct ProductTypeService {
    db: Arc<DbPool>,
    #[allow(dead_code)]
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductTypeInput {
    pub product_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductTypeInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ProductTypeService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(product_id = %input.product_id, name = %input.name))]
    pub async fn create_product_type(
        &self,
        input: CreateProductTypeInput,
        actor: Uuid,
    ) -> Result<product_type::Model, ServiceError> {
        // Parent must exist and be live
        product::Entity::find_by_id(input.product_id)
            .filter(product::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Product with ID {} not found",
                    input.product_id
                ))
            })?;

        self.ensure_unique_name(input.product_id, &input.name, None)
            .await?;

        let model = product_type::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;
        info!("Created product type: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product_type(
        &self,
        type_id: Uuid,
        input: UpdateProductTypeInput,
        actor: Uuid,
    ) -> Result<product_type::Model, ServiceError> {
        let existing = self.get_product_type(type_id).await?;

        if let Some(ref name) = input.name {
            self.ensure_unique_name(existing.product_id, name, Some(type_id))
                .await?;
        }

        let mut active: product_type::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        active.updated_by = Set(Some(actor));

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_product_type(&self, type_id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_product_type(type_id).await?;

        let live_units = inventory_unit::Entity::find()
            .filter(inventory_unit::Column::ProductTypeId.eq(type_id))
            .filter(inventory_unit::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if live_units > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product type {} still has {} assembled unit(s)",
                type_id, live_units
            )));
        }

        let mut active: product_type::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.deleted_by = Set(Some(actor));
        active.update(&*self.db).await?;

        info!("Soft-deleted product type: {}", type_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_product_type(
        &self,
        type_id: Uuid,
    ) -> Result<product_type::Model, ServiceError> {
        product_type::Entity::find_by_id(type_id)
            .filter(product_type::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product type with ID {} not found", type_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_product_types(
        &self,
        product_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product_type::Model>, u64), ServiceError> {
        let mut query = product_type::Entity::find()
            .filter(product_type::Column::DeletedAt.is_null())
            .order_by_asc(product_type::Column::Name);
        if let Some(pid) = product_id {
            query = query.filter(product_type::Column::ProductId.eq(pid));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Type names are unique per product among non-deleted rows.
    async fn ensure_unique_name(
        &self,
        product_id: Uuid,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = product_type::Entity::find()
            .filter(product_type::Column::ProductId.eq(product_id))
            .filter(product_type::Column::Name.eq(name.trim()))
            .filter(product_type::Column::DeletedAt.is_null());
        if let Some(id) = exclude_id {
            query = query.filter(product_type::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product type '{}' already exists for this product",
                name.trim()
            )));
        }
        Ok(())
    }
}
