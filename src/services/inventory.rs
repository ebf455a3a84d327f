use crate::{
    db::DbPool,
    entities::{
        inventory_unit, product, product_type, sale_item, technician, testing, TestedStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    serials,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Service for assembled device units and their test records.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

/// Input for assembling units. Serials come either as an explicit list
/// or as a from/to range expanded into one unit per serial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembleUnitsInput {
    pub product_id: Uuid,
    pub product_type_id: Uuid,
    #[serde(default)]
    pub serials: Vec<String>,
    pub serial_from: Option<String>,
    pub serial_to: Option<String>,
    pub assembled_on: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUnitInput {
    pub product_type_id: Option<Uuid>,
    pub serial_no: Option<String>,
    pub assembled_on: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordTestInput {
    pub technician_id: Uuid,
    pub status: TestedStatus,
    pub remarks: Option<String>,
}

/// Filters accepted by the unit listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitFilter {
    pub product_id: Option<Uuid>,
    pub product_type_id: Option<Uuid>,
    pub tested_status: Option<TestedStatus>,
    /// `Some(true)` = only units on an active sale, `Some(false)` = unsold
    pub sold: Option<bool>,
}

/// A unit with the related rows the UI renders alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDetails {
    pub unit: inventory_unit::Model,
    pub product: Option<product::Model>,
    pub product_type: Option<product_type::Model>,
    pub tests: Vec<testing::Model>,
}

/// Per-status unit counts for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCounts {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub pass: u64,
    pub fail: u64,
    pub sold: u64,
}

impl InventoryService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create assembled units for a serial list or range, all or
    /// nothing: one duplicate serial aborts the whole batch.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn assemble_units(
        &self,
        input: AssembleUnitsInput,
        actor: Uuid,
    ) -> Result<Vec<inventory_unit::Model>, ServiceError> {
        let serial_list = resolve_serials(&input)?;
        if serial_list.is_empty() {
            return Err(ServiceError::ValidationError(
                "Provide serial numbers or a serial range".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start assembly transaction");
            ServiceError::DatabaseError(e)
        })?;

        ensure_type_belongs_to_product(&txn, input.product_id, input.product_type_id).await?;

        // Serial uniqueness is scoped per product among non-deleted units
        let existing: HashSet<String> = inventory_unit::Entity::find()
            .filter(inventory_unit::Column::ProductId.eq(input.product_id))
            .filter(inventory_unit::Column::DeletedAt.is_null())
            .all(&txn)
            .await?
            .into_iter()
            .map(|u| serials::normalize(&u.serial_no))
            .collect();

        let mut batch_seen = HashSet::new();
        let mut created = Vec::with_capacity(serial_list.len());
        for serial in &serial_list {
            let normalized = serials::normalize(serial);
            if existing.contains(&normalized) {
                return Err(ServiceError::Conflict(format!(
                    "Serial '{}' already exists for this product",
                    serial
                )));
            }
            if !batch_seen.insert(normalized) {
                return Err(ServiceError::Conflict(format!(
                    "Serial '{}' appears more than once in this batch",
                    serial
                )));
            }

            let model = inventory_unit::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(input.product_id),
                product_type_id: Set(input.product_type_id),
                serial_no: Set(serial.clone()),
                tested_status: Set(TestedStatus::Pending),
                assembled_on: Set(input.assembled_on),
                remarks: Set(input.remarks.clone()),
                created_by: Set(Some(actor)),
                updated_by: Set(Some(actor)),
                deleted_at: Set(None),
                deleted_by: Set(None),
                ..Default::default()
            };
            created.push(model.insert(&txn).await?);
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::UnitsAssembled {
                product_id: input.product_id,
                count: created.len(),
            })
            .await;

        info!(
            product_id = %input.product_id,
            count = created.len(),
            "Assembled units"
        );
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_unit(
        &self,
        unit_id: Uuid,
        input: UpdateUnitInput,
        actor: Uuid,
    ) -> Result<inventory_unit::Model, ServiceError> {
        let existing = self.find_live_unit(unit_id).await?;

        if let Some(type_id) = input.product_type_id {
            ensure_type_belongs_to_product(&*self.db, existing.product_id, type_id).await?;
        }

        if let Some(ref serial) = input.serial_no {
            let normalized = serials::normalize(serial);
            let clash = inventory_unit::Entity::find()
                .filter(inventory_unit::Column::ProductId.eq(existing.product_id))
                .filter(inventory_unit::Column::DeletedAt.is_null())
                .filter(inventory_unit::Column::Id.ne(unit_id))
                .all(&*self.db)
                .await?
                .into_iter()
                .any(|u| serials::normalize(&u.serial_no) == normalized);
            if clash {
                return Err(ServiceError::Conflict(format!(
                    "Serial '{}' already exists for this product",
                    serial
                )));
            }
        }

        let mut active: inventory_unit::ActiveModel = existing.into();
        if let Some(type_id) = input.product_type_id {
            active.product_type_id = Set(type_id);
        }
        if let Some(serial) = input.serial_no {
            active.serial_no = Set(serial.trim().to_string());
        }
        if let Some(assembled_on) = input.assembled_on {
            active.assembled_on = Set(Some(assembled_on));
        }
        if let Some(remarks) = input.remarks {
            active.remarks = Set(Some(remarks));
        }
        active.updated_by = Set(Some(actor));

        Ok(active.update(&*self.db).await?)
    }

    /// Soft-delete a unit. Units on an active sale cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_unit(&self, unit_id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        let existing = self.find_live_unit(unit_id).await?;

        let on_sale = sale_item::Entity::find()
            .filter(sale_item::Column::InventoryUnitId.eq(unit_id))
            .filter(sale_item::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        if on_sale > 0 {
            return Err(ServiceError::Conflict(format!(
                "Unit {} is on an active sale and cannot be deleted",
                unit_id
            )));
        }

        let mut active: inventory_unit::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now()));
        active.deleted_by = Set(Some(actor));
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::UnitDeleted(unit_id))
            .await;

        info!("Soft-deleted unit: {}", unit_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_unit(&self, unit_id: Uuid) -> Result<UnitDetails, ServiceError> {
        let unit = self.find_live_unit(unit_id).await?;
        let product = product::Entity::find_by_id(unit.product_id)
            .one(&*self.db)
            .await?;
        let product_type = product_type::Entity::find_by_id(unit.product_type_id)
            .one(&*self.db)
            .await?;
        let tests = testing::Entity::find()
            .filter(testing::Column::InventoryUnitId.eq(unit_id))
            .filter(testing::Column::DeletedAt.is_null())
            .order_by_desc(testing::Column::TestedOn)
            .all(&*self.db)
            .await?;

        Ok(UnitDetails {
            unit,
            product,
            product_type,
            tests,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_units(
        &self,
        filter: UnitFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<inventory_unit::Model>, u64), ServiceError> {
        let mut query = inventory_unit::Entity::find()
            .filter(inventory_unit::Column::DeletedAt.is_null())
            .order_by_asc(inventory_unit::Column::SerialNo);

        if let Some(pid) = filter.product_id {
            query = query.filter(inventory_unit::Column::ProductId.eq(pid));
        }
        if let Some(tid) = filter.product_type_id {
            query = query.filter(inventory_unit::Column::ProductTypeId.eq(tid));
        }
        if let Some(status) = filter.tested_status {
            query = query.filter(inventory_unit::Column::TestedStatus.eq(status));
        }
        if let Some(sold) = filter.sold {
            let sold_unit_ids: Vec<Uuid> = sale_item::Entity::find()
                .filter(sale_item::Column::DeletedAt.is_null())
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|item| item.inventory_unit_id)
                .collect();
            query = if sold {
                query.filter(inventory_unit::Column::Id.is_in(sold_unit_ids))
            } else {
                query.filter(inventory_unit::Column::Id.is_not_in(sold_unit_ids))
            };
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Dashboard counts per tested status.
    #[instrument(skip(self))]
    pub async fn unit_counts(&self) -> Result<UnitCounts, ServiceError> {
        let count_for = |status: TestedStatus| {
            inventory_unit::Entity::find()
                .filter(inventory_unit::Column::DeletedAt.is_null())
                .filter(inventory_unit::Column::TestedStatus.eq(status))
                .count(&*self.db)
        };

        let total = inventory_unit::Entity::find()
            .filter(inventory_unit::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        let pending = count_for(TestedStatus::Pending).await?;
        let in_progress = count_for(TestedStatus::InProgress).await?;
        let pass = count_for(TestedStatus::Pass).await?;
        let fail = count_for(TestedStatus::Fail).await?;
        let sold = sale_item::Entity::find()
            .filter(sale_item::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;

        Ok(UnitCounts {
            total,
            pending,
            in_progress,
            pass,
            fail,
            sold,
        })
    }

    /// Record a test run and mirror the result onto the unit.
    #[instrument(skip(self, input), fields(unit_id = %unit_id))]
    pub async fn record_test(
        &self,
        unit_id: Uuid,
        input: RecordTestInput,
        actor: Uuid,
    ) -> Result<testing::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let unit = inventory_unit::Entity::find_by_id(unit_id)
            .filter(inventory_unit::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory unit with ID {} not found", unit_id))
            })?;

        technician::Entity::find_by_id(input.technician_id)
            .filter(technician::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Technician with ID {} not found",
                    input.technician_id
                ))
            })?;

        let record = testing::ActiveModel {
            id: Set(Uuid::new_v4()),
            inventory_unit_id: Set(unit_id),
            technician_id: Set(input.technician_id),
            status: Set(input.status),
            tested_on: Set(Utc::now()),
            remarks: Set(input.remarks),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };
        let record = record.insert(&txn).await?;

        let mut unit_active: inventory_unit::ActiveModel = unit.into();
        unit_active.tested_status = Set(input.status);
        unit_active.updated_by = Set(Some(actor));
        unit_active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::UnitTested {
                unit_id,
                status: input.status.to_string(),
            })
            .await;

        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn list_tests(&self, unit_id: Uuid) -> Result<Vec<testing::Model>, ServiceError> {
        self.find_live_unit(unit_id).await?;
        Ok(testing::Entity::find()
            .filter(testing::Column::InventoryUnitId.eq(unit_id))
            .filter(testing::Column::DeletedAt.is_null())
            .order_by_desc(testing::Column::TestedOn)
            .all(&*self.db)
            .await?)
    }

    async fn find_live_unit(&self, unit_id: Uuid) -> Result<inventory_unit::Model, ServiceError> {
        inventory_unit::Entity::find_by_id(unit_id)
            .filter(inventory_unit::Column::DeletedAt.is_null())
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Inventory unit with ID {} not found", unit_id))
            })
    }
}

fn resolve_serials(input: &AssembleUnitsInput) -> Result<Vec<String>, ServiceError> {
    let mut list: Vec<String> = input
        .serials
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    match (&input.serial_from, &input.serial_to) {
        (Some(from), Some(to)) => {
            let expanded = serials::expand_range(from, to)
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
            list.extend(expanded);
        }
        (None, None) => {}
        _ => {
            return Err(ServiceError::ValidationError(
                "serial_from and serial_to must be provided together".into(),
            ));
        }
    }

    Ok(list)
}

async fn ensure_type_belongs_to_product<C: ConnectionTrait>(
    db: &C,
    product_id: Uuid,
    product_type_id: Uuid,
) -> Result<(), ServiceError> {
    product::Entity::find_by_id(product_id)
        .filter(product::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("Product with ID {} not found", product_id))
        })?;

    let type_row = product_type::Entity::find_by_id(product_type_id)
        .filter(product_type::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Product type with ID {} not found",
                product_type_id
            ))
        })?;

    if type_row.product_id != product_id {
        return Err(ServiceError::ValidationError(format!(
            "Product type {} does not belong to product {}",
            product_type_id, product_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_list_and_range_merge() {
        let input = AssembleUnitsInput {
            product_id: Uuid::new_v4(),
            product_type_id: Uuid::new_v4(),
            serials: vec![" VCI-100 ".into()],
            serial_from: Some("VCI-200".into()),
            serial_to: Some("VCI-201".into()),
            assembled_on: None,
            remarks: None,
        };
        assert_eq!(
            resolve_serials(&input).unwrap(),
            vec!["VCI-100", "VCI-200", "VCI-201"]
        );
    }

    #[test]
    fn dangling_range_endpoint_is_rejected() {
        let input = AssembleUnitsInput {
            product_id: Uuid::new_v4(),
            product_type_id: Uuid::new_v4(),
            serials: vec![],
            serial_from: None,
            serial_to: Some("VCI-300".into()),
            assembled_on: None,
            remarks: None,
        };
        assert!(resolve_serials(&input).is_err());
    }
}
