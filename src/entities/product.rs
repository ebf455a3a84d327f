use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Product entity
///
/// A product is an assembled device model. Its bill of materials lists
/// the spare parts (and per-unit quantities) consumed when one unit is
/// assembled; it is stored as a JSON association list so the catalog can
/// evolve without schema changes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Product name, unique among non-deleted products
    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: String,

    /// Product description
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,

    /// Bill of materials: JSON list of `{sparepart_id, required_quantity}`
    pub bill_of_materials: Json,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,

    /// Actor that created the row
    pub created_by: Option<Uuid>,

    /// Actor that last updated the row
    pub updated_by: Option<Uuid>,

    /// Soft-delete timestamp; non-null means the row is inactive
    pub deleted_at: Option<DateTime<Utc>>,

    /// Actor that soft-deleted the row
    pub deleted_by: Option<Uuid>,
}

/// One line of a product's bill of materials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BomComponent {
    pub sparepart_id: Uuid,
    pub required_quantity: i32,
}

impl Model {
    /// Parse the stored bill of materials into typed components.
    pub fn bom_components(&self) -> Result<Vec<BomComponent>, serde_json::Error> {
        serde_json::from_value(self.bill_of_materials.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_type::Entity")]
    ProductTypes,
    #[sea_orm(has_many = "super::inventory_unit::Entity")]
    InventoryUnits,
}

impl Related<super::product_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductTypes.def()
    }
}

impl Related<super::inventory_unit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryUnits.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.bill_of_materials {
                active_model.bill_of_materials = Set(serde_json::json!([]));
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        Ok(active_model)
    }
}
