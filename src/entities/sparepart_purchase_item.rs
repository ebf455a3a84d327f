use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Spare-part purchase line
///
/// Serial-tracked parts get one row per serial (expanded from a range
/// at intake time) with `quantity = 1`; counted parts get a single row
/// with the purchased quantity.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sparepart_purchase_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub purchase_id: Uuid,

    pub sparepart_id: Uuid,

    pub quantity: i32,

    pub unit_price: Option<Decimal>,

    /// Serial number as received; displayed verbatim, matched normalized
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
        belongs_to = "super::sparepart_purchase::Entity",
        from = "Column::PurchaseId",
        to = "super::sparepart_purchase::Column::Id"
    )]
    Purchase,
    #[sea_orm(
        belongs_to = "super::sparepart::Entity",
        from = "Column::SparepartId",
        to = "super::sparepart::Column::Id"
    )]
    Sparepart,
}

impl Related<super::sparepart_purchase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchase.def()
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
