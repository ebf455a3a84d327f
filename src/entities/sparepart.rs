use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Spare part entity
///
/// Parts are consumed by assembly (per the product bill of materials)
/// and by vendor-service repairs. Parts whose name contains "pcb" are
/// serial-tracked: their stock is a set of serial numbers rather than a
/// count.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "spareparts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Part name, unique among non-deleted parts
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Manufacturer part number
    pub part_no: Option<String>,

    /// Unit of measure (e.g. "pcs")
    pub unit: Option<String>,

    pub description: Option<String>,

    /// Reorder threshold used by the availability report
    pub minimum_stock: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
}

impl Model {
    /// Serial-tracked parts are stocked by serial-number set difference
    /// instead of aggregate counts.
    pub fn is_serial_tracked(&self) -> bool {
        self.name.to_lowercase().contains("pcb")
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sparepart_purchase_item::Entity")]
    PurchaseItems,
    #[sea_orm(has_many = "super::service_part_usage::Entity")]
    ServiceUsages,
}

impl Related<super::sparepart_purchase_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseItems.def()
    }
}

impl Related<super::service_part_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceUsages.def()
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
            active_model.created_at = Set(Utc::now());
        }
        active_model.updated_at = Set(Some(Utc::now()));
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            part_no: None,
            unit: None,
            description: None,
            minimum_stock: None,
            created_at: Utc::now(),
            updated_at: None,
            created_by: None,
            updated_by: None,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn serial_tracking_matches_pcb_names_case_insensitively() {
        assert!(part("Main PCB v2").is_serial_tracked());
        assert!(part("pcb assembly").is_serial_tracked());
        assert!(!part("Enclosure screw").is_serial_tracked());
    }
}
