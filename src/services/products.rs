use crate::{
    db::DbPool,
    entities::{inventory_unit, product, product_type, sparepart},
    entities::product::BomComponent,
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

/// Service for the product catalog.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

/// Input for creating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub bill_of_materials: Vec<BomComponent>,
}

/// Input for updating a product; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub bill_of_materials: Option<Vec<BomComponent>>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
        actor: Uuid,
    ) -> Result<product::Model, ServiceError> {
        self.ensure_unique_name(&input.name, None).await?;
        self.validate_bom(&input.bill_of_materials).await?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            bill_of_materials: Set(serde_json::to_value(&input.bill_of_materials)?),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;

        info!("Created product: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
        actor: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(product_id).await?;

        if let Some(ref name) = input.name {
            self.ensure_unique_name(name, Some(product_id)).await?;
        }
        if let Some(ref bom) = input.bill_of_materials {
            self.validate_bom(bom).await?;
        }

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(bom) = input.bill_of_materials {
            active.bill_of_materials = Set(serde_json::to_value(&bom)?);
        }
        active.updated_by = Set(Some(actor));

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        Ok(updated)
    }

    /// Soft-delete a product. Products still referenced by non-deleted
    /// product types or assembled units cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_product(product_id).await?;

        let live_types = product_type::Entity::find()
            .filter(product_type::Column::ProductId.eq(product_id))
            .filter(product_type::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if live_types > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} still has {} product type(s)",
                product_id, live_types
            )));
        }

        let live_units = inventory_unit::Entity::find()
            .filter(inventory_unit::Column::ProductId.eq(product_id))
            .filter(inventory_unit::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if live_units > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} still has {} assembled unit(s)",
                product_id, live_units
            )));
        }

        let mut active: product::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.deleted_by = Set(Some(actor));
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!("Soft-deleted product: {}", product_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .filter(product::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product with ID {} not found", product_id))
            })
    }

    /// Fetch a product together with its non-deleted types.
    #[instrument(skip(self))]
    pub async fn get_product_with_types(
        &self,
        product_id: Uuid,
    ) -> Result<(product::Model, Vec<product_type::Model>), ServiceError> {
        let product = self.get_product(product_id).await?;
        let types = product_type::Entity::find()
            .filter(product_type::Column::ProductId.eq(product_id))
            .filter(product_type::Column::DeletedAt.is_null())
            .order_by_asc(product_type::Column::Name)
            .all(&*self.db)
            .await?;
        Ok((product, types))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = product::Entity::find()
            .filter(product::Column::DeletedAt.is_null())
            .order_by_asc(product::Column::Name);

        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query = query.filter(product::Column::Name.contains(term.trim()));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Uniqueness check scoped to non-deleted rows, excluding the row
    /// being updated.
    async fn ensure_unique_name(
        &self,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = product::Entity::find()
            .filter(product::Column::Name.eq(name.trim()))
            .filter(product::Column::DeletedAt.is_null());
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product name '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    /// Every BOM line must reference an existing non-deleted spare part
    /// with a positive quantity; duplicate parts are rejected.
    async fn validate_bom(&self, bom: &[BomComponent]) -> Result<(), ServiceError> {
        let mut seen = std::collections::HashSet::new();
        for line in bom {
            if line.required_quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Bill of materials quantity for part {} must be positive",
                    line.sparepart_id
                )));
            }
            if !seen.insert(line.sparepart_id) {
                return Err(ServiceError::ValidationError(format!(
                    "Bill of materials lists part {} more than once",
                    line.sparepart_id
                )));
            }
            let exists = sparepart::Entity::find_by_id(line.sparepart_id)
                .filter(sparepart::Column::DeletedAt.is_null())
                .one(&*self.db)
                .await?
                .is_some();
            if !exists {
                return Err(ServiceError::ValidationError(format!(
                    "Bill of materials references unknown spare part {}",
                    line.sparepart_id
                )));
            }
        }
        Ok(())
    }
}
