use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Spare parts consumed while repairing one service-order item.
///
/// Serial-tracked replacement parts carry the replacement serial so the
/// availability query can subtract it from purchased stock.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_part_usages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub service_order_item_id: Uuid,

    pub sparepart_id: Uuid,

    pub quantity: i32,

    pub serial_no: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_order_item::Entity",
        from = "Column::ServiceOrderItemId",
        to = "super::service_order_item::Column::Id"
    )]
    ServiceOrderItem,
    #[sea_orm(
        belongs_to = "super::sparepart::Entity",
        from = "Column::SparepartId",
        to = "super::sparepart::Column::Id"
    )]
    Sparepart,
}

impl Related<super::service_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceOrderItem.def()
    }
}

impl Related<super::sparepart::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sparepart.def()
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
