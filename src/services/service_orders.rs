use crate::{
    db::DbPool,
    entities::{
        service_delivery, service_delivery_item, service_order, service_order_item,
        service_part_usage, sparepart, vendor, ServiceStatus,
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

/// Service for the vendor repair workflow: intake, part usage, and
/// delivery of repaired devices.
#[derive(Clone)]
pub struct ServiceOrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceItemInput {
    pub serial_no: String,
    pub complaint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateServiceOrderInput {
    pub vendor_id: Uuid,
    pub challan_no: String,
    pub received_date: NaiveDate,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<ServiceItemInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServiceOrderInput {
    pub vendor_id: Option<Uuid>,
    pub challan_no: Option<String>,
    pub received_date: Option<NaiveDate>,
    pub document_path: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPartUsageInput {
    pub sparepart_id: Uuid,
    pub quantity: i32,
    pub serial_no: Option<String>,
    pub diagnosis: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeliveryInput {
    pub challan_no: String,
    pub delivery_date: NaiveDate,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    /// Serials being handed back; each must be in service on this order
    /// and not yet delivered
    pub serials: Vec<String>,
}

/// One intake line with its consumption and delivery state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceItemDetails {
    pub item: service_order_item::Model,
    pub part_usages: Vec<service_part_usage::Model>,
    pub delivered: bool,
}

/// A service order with the related rows the UI renders alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOrderDetails {
    pub order: service_order::Model,
    pub vendor: Option<vendor::Model>,
    pub items: Vec<ServiceItemDetails>,
    pub deliveries: Vec<service_delivery::Model>,
}

/// Derive the order status from delivery progress.
pub fn compute_status(total_items: usize, delivered_items: usize, has_usage: bool) -> ServiceStatus {
    if total_items > 0 && delivered_items >= total_items {
        ServiceStatus::Delivered
    } else if delivered_items > 0 {
        ServiceStatus::PartiallyDelivered
    } else if has_usage {
        ServiceStatus::InProgress
    } else {
        ServiceStatus::Received
    }
}

impl ServiceOrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Intake: header + one item per device serial, all or nothing. A
    /// serial already in open service anywhere is a conflict.
    #[instrument(skip(self, input), fields(challan_no = %input.challan_no))]
    pub async fn create_service_order(
        &self,
        input: CreateServiceOrderInput,
        actor: Uuid,
    ) -> Result<ServiceOrderDetails, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "A service order needs at least one item".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start service order transaction");
            ServiceError::DatabaseError(e)
        })?;

        vendor::Entity::find_by_id(input.vendor_id)
            .filter(vendor::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Vendor with ID {} not found",
                    input.vendor_id
                ))
            })?;

        ensure_unique_order_challan(&txn, &input.challan_no, None).await?;

        let in_open_service = open_service_serials(&txn).await?;

        let order_id = Uuid::new_v4();
        let header = service_order::ActiveModel {
            id: Set(order_id),
            vendor_id: Set(input.vendor_id),
            challan_no: Set(input.challan_no.trim().to_string()),
            received_date: Set(input.received_date),
            status: Set(ServiceStatus::Received),
            document_path: Set(input.document_path),
            notes: Set(input.notes),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };
        let order = header.insert(&txn).await?;

        let mut batch_seen = HashSet::new();
        for item in &input.items {
            let normalized = serials::normalize(&item.serial_no);
            if normalized.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Empty serial number in service items".into(),
                ));
            }
            if in_open_service.contains(&normalized) {
                return Err(ServiceError::Conflict(format!(
                    "Serial '{}' is already in service",
                    item.serial_no.trim()
                )));
            }
            if !batch_seen.insert(normalized) {
                return Err(ServiceError::Conflict(format!(
                    "Serial '{}' appears more than once in this intake",
                    item.serial_no.trim()
                )));
            }

            let model = service_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                service_order_id: Set(order_id),
                serial_no: Set(item.serial_no.trim().to_string()),
                complaint: Set(item.complaint.clone()),
                diagnosis: Set(None),
                created_by: Set(Some(actor)),
                updated_by: Set(Some(actor)),
                deleted_at: Set(None),
                deleted_by: Set(None),
                ..Default::default()
            };
            model.insert(&txn).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ServiceOrderReceived(order_id))
            .await;

        info!(order_id = %order_id, items = input.items.len(), "Service order received");
        self.get_service_order(order.id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_service_order(
        &self,
        order_id: Uuid,
        input: UpdateServiceOrderInput,
        actor: Uuid,
    ) -> Result<ServiceOrderDetails, ServiceError> {
        let existing = find_live_order(&*self.db, order_id).await?;

        if let Some(vendor_id) = input.vendor_id {
            vendor::Entity::find_by_id(vendor_id)
                .filter(vendor::Column::DeletedAt.is_null())
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Vendor with ID {} not found",
                        vendor_id
                    ))
                })?;
        }
        if let Some(ref challan) = input.challan_no {
            ensure_unique_order_challan(&*self.db, challan, Some(order_id)).await?;
        }

        let mut active: service_order::ActiveModel = existing.into();
        if let Some(vendor_id) = input.vendor_id {
            active.vendor_id = Set(vendor_id);
        }
        if let Some(challan) = input.challan_no {
            active.challan_no = Set(challan.trim().to_string());
        }
        if let Some(received_date) = input.received_date {
            active.received_date = Set(received_date);
        }
        if let Some(document_path) = input.document_path {
            active.document_path = Set(Some(document_path));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_by = Set(Some(actor));
        active.update(&*self.db).await?;

        self.get_service_order(order_id).await
    }

    /// Soft-delete an intake that has not shipped anything back yet;
    /// items and part usages are retired with it.
    #[instrument(skip(self))]
    pub async fn delete_service_order(
        &self,
        order_id: Uuid,
        actor: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = find_live_order(&txn, order_id).await?;

        let deliveries = service_delivery::Entity::find()
            .filter(service_delivery::Column::ServiceOrderId.eq(order_id))
            .filter(service_delivery::Column::DeletedAt.is_null())
            .count(&txn)
            .await?;
        if deliveries > 0 {
            return Err(ServiceError::Conflict(format!(
                "Service order {} has {} delivery record(s) and cannot be deleted",
                order_id, deliveries
            )));
        }

        let now = Utc::now();
        let items = service_order_item::Entity::find()
            .filter(service_order_item::Column::ServiceOrderId.eq(order_id))
            .filter(service_order_item::Column::DeletedAt.is_null())
            .all(&txn)
            .await?;
        for item in items {
            let usages = service_part_usage::Entity::find()
                .filter(service_part_usage::Column::ServiceOrderItemId.eq(item.id))
                .filter(service_part_usage::Column::DeletedAt.is_null())
                .all(&txn)
                .await?;
            for usage in usages {
                let mut active: service_part_usage::ActiveModel = usage.into();
                active.deleted_at = Set(Some(now));
                active.deleted_by = Set(Some(actor));
                active.update(&txn).await?;
            }

            let mut active: service_order_item::ActiveModel = item.into();
            active.deleted_at = Set(Some(now));
            active.deleted_by = Set(Some(actor));
            active.update(&txn).await?;
        }

        let mut active: service_order::ActiveModel = existing.into();
        active.deleted_at = Set(Some(now));
        active.deleted_by = Set(Some(actor));
        active.update(&txn).await?;

        txn.commit().await?;

        info!("Soft-deleted service order: {}", order_id);
        Ok(())
    }

    /// Record parts consumed while repairing one intake item.
    #[instrument(skip(self, input), fields(order_id = %order_id, item_id = %item_id))]
    pub async fn record_part_usage(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        input: RecordPartUsageInput,
        actor: Uuid,
    ) -> Result<service_part_usage::Model, ServiceError> {
        if input.quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Usage quantity must be positive".into(),
            ));
        }

        let txn = self.db.begin().await?;

        let order = find_live_order(&txn, order_id).await?;
        let item = service_order_item::Entity::find_by_id(item_id)
            .filter(service_order_item::Column::ServiceOrderId.eq(order_id))
            .filter(service_order_item::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Service item with ID {} not found on order {}",
                    item_id, order_id
                ))
            })?;

        let part = sparepart::Entity::find_by_id(input.sparepart_id)
            .filter(sparepart::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Spare part with ID {} not found",
                    input.sparepart_id
                ))
            })?;

        if part.is_serial_tracked() && input.serial_no.as_deref().map_or(true, |s| s.trim().is_empty())
        {
            return Err(ServiceError::ValidationError(format!(
                "Part '{}' is serial-tracked; provide the replacement serial",
                part.name
            )));
        }

        let usage = service_part_usage::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_order_item_id: Set(item.id),
            sparepart_id: Set(input.sparepart_id),
            quantity: Set(input.quantity),
            serial_no: Set(input.serial_no.map(|s| s.trim().to_string())),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };
        let usage = usage.insert(&txn).await?;

        if let Some(diagnosis) = input.diagnosis {
            let mut item_active: service_order_item::ActiveModel = item.into();
            item_active.diagnosis = Set(Some(diagnosis));
            item_active.updated_by = Set(Some(actor));
            item_active.update(&txn).await?;
        }

        if order.status == ServiceStatus::Received {
            let mut order_active: service_order::ActiveModel = order.into();
            order_active.status = Set(ServiceStatus::InProgress);
            order_active.updated_by = Set(Some(actor));
            order_active.update(&txn).await?;
        }

        txn.commit().await?;
        Ok(usage)
    }

    /// Deliver repaired serials back to the vendor, all or nothing.
    #[instrument(skip(self, input), fields(order_id = %order_id, challan_no = %input.challan_no))]
    pub async fn create_delivery(
        &self,
        order_id: Uuid,
        input: CreateDeliveryInput,
        actor: Uuid,
    ) -> Result<ServiceOrderDetails, ServiceError> {
        if input.serials.is_empty() {
            return Err(ServiceError::ValidationError(
                "A delivery needs at least one serial".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start delivery transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = find_live_order(&txn, order_id).await?;
        ensure_unique_delivery_challan(&txn, &input.challan_no, None).await?;

        let items = service_order_item::Entity::find()
            .filter(service_order_item::Column::ServiceOrderId.eq(order_id))
            .filter(service_order_item::Column::DeletedAt.is_null())
            .all(&txn)
            .await?;

        let delivered_item_ids = delivered_item_ids(&txn, &items).await?;

        let delivery_id = Uuid::new_v4();
        let header = service_delivery::ActiveModel {
            id: Set(delivery_id),
            service_order_id: Set(order_id),
            challan_no: Set(input.challan_no.trim().to_string()),
            delivery_date: Set(input.delivery_date),
            document_path: Set(input.document_path),
            notes: Set(input.notes),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };
        header.insert(&txn).await?;

        let mut batch_seen = HashSet::new();
        let mut newly_delivered = 0usize;
        for serial in &input.serials {
            let normalized = serials::normalize(serial);

            let item = items
                .iter()
                .find(|item| serials::normalize(&item.serial_no) == normalized)
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Serial '{}' is not in service on this order",
                        serial.trim()
                    ))
                })?;

            if delivered_item_ids.contains(&item.id) {
                return Err(ServiceError::Conflict(format!(
                    "Serial '{}' was already delivered",
                    serial.trim()
                )));
            }
            if !batch_seen.insert(normalized) {
                return Err(ServiceError::Conflict(format!(
                    "Serial '{}' appears more than once in this delivery",
                    serial.trim()
                )));
            }

            let model = service_delivery_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                service_delivery_id: Set(delivery_id),
                service_order_item_id: Set(item.id),
                serial_no: Set(item.serial_no.clone()),
                created_by: Set(Some(actor)),
                updated_by: Set(Some(actor)),
                deleted_at: Set(None),
                deleted_by: Set(None),
                ..Default::default()
            };
            model.insert(&txn).await?;
            newly_delivered += 1;
        }

        let total_delivered = delivered_item_ids.len() + newly_delivered;
        let status = compute_status(items.len(), total_delivered, true);
        let mut order_active: service_order::ActiveModel = order.into();
        order_active.status = Set(status);
        order_active.updated_by = Set(Some(actor));
        order_active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::ServiceDeliveryCreated(delivery_id))
            .await;

        info!(delivery_id = %delivery_id, serials = input.serials.len(), "Service delivery created");
        self.get_service_order(order_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_service_order(
        &self,
        order_id: Uuid,
    ) -> Result<ServiceOrderDetails, ServiceError> {
        let order = find_live_order(&*self.db, order_id).await?;

        let vendor = vendor::Entity::find_by_id(order.vendor_id)
            .one(&*self.db)
            .await?;

        let items = service_order_item::Entity::find()
            .filter(service_order_item::Column::ServiceOrderId.eq(order_id))
            .filter(service_order_item::Column::DeletedAt.is_null())
            .order_by_asc(service_order_item::Column::SerialNo)
            .all(&*self.db)
            .await?;

        let delivered = delivered_item_ids(&*self.db, &items).await?;

        let mut item_details = Vec::with_capacity(items.len());
        for item in items {
            let part_usages = service_part_usage::Entity::find()
                .filter(service_part_usage::Column::ServiceOrderItemId.eq(item.id))
                .filter(service_part_usage::Column::DeletedAt.is_null())
                .all(&*self.db)
                .await?;
            let is_delivered = delivered.contains(&item.id);
            item_details.push(ServiceItemDetails {
                item,
                part_usages,
                delivered: is_delivered,
            });
        }

        let deliveries = service_delivery::Entity::find()
            .filter(service_delivery::Column::ServiceOrderId.eq(order_id))
            .filter(service_delivery::Column::DeletedAt.is_null())
            .order_by_asc(service_delivery::Column::DeliveryDate)
            .all(&*self.db)
            .await?;

        Ok(ServiceOrderDetails {
            order,
            vendor,
            items: item_details,
            deliveries,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_service_orders(
        &self,
        vendor_id: Option<Uuid>,
        status: Option<ServiceStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<service_order::Model>, u64), ServiceError> {
        let mut query = service_order::Entity::find()
            .filter(service_order::Column::DeletedAt.is_null())
            .order_by_desc(service_order::Column::ReceivedDate);
        if let Some(vid) = vendor_id {
            query = query.filter(service_order::Column::VendorId.eq(vid));
        }
        if let Some(status) = status {
            query = query.filter(service_order::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}

async fn find_live_order<C: ConnectionTrait>(
    db: &C,
    order_id: Uuid,
) -> Result<service_order::Model, ServiceError> {
    service_order::Entity::find_by_id(order_id)
        .filter(service_order::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Service order with ID {} not found", order_id))
        })
}

async fn ensure_unique_order_challan<C: ConnectionTrait>(
    db: &C,
    challan_no: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = service_order::Entity::find()
        .filter(service_order::Column::ChallanNo.eq(challan_no.trim()))
        .filter(service_order::Column::DeletedAt.is_null());
    if let Some(id) = exclude_id {
        query = query.filter(service_order::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "Challan number '{}' is already used by another service order",
            challan_no.trim()
        )));
    }
    Ok(())
}

async fn ensure_unique_delivery_challan<C: ConnectionTrait>(
    db: &C,
    challan_no: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = service_delivery::Entity::find()
        .filter(service_delivery::Column::ChallanNo.eq(challan_no.trim()))
        .filter(service_delivery::Column::DeletedAt.is_null());
    if let Some(id) = exclude_id {
        query = query.filter(service_delivery::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "Challan number '{}' is already used by another delivery",
            challan_no.trim()
        )));
    }
    Ok(())
}

/// IDs of the given intake items that already have a live delivery row.
async fn delivered_item_ids<C: ConnectionTrait>(
    db: &C,
    items: &[service_order_item::Model],
) -> Result<HashSet<Uuid>, ServiceError> {
    let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    Ok(service_delivery_item::Entity::find()
        .filter(service_delivery_item::Column::ServiceOrderItemId.is_in(ids))
        .filter(service_delivery_item::Column::DeletedAt.is_null())
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.service_order_item_id)
        .collect())
}

/// Serials currently in open service anywhere: live intake items that
/// have no live delivery row yet, in normalized form.
async fn open_service_serials<C: ConnectionTrait>(db: &C) -> Result<HashSet<String>, ServiceError> {
    let items = service_order_item::Entity::find()
        .filter(service_order_item::Column::DeletedAt.is_null())
        .all(db)
        .await?;
    let delivered = delivered_item_ids(db, &items).await?;
    Ok(items
        .into_iter()
        .filter(|item| !delivered.contains(&item.id))
        .map(|item| serials::normalize(&item.serial_no))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_delivery_progress() {
        assert_eq!(compute_status(3, 0, false), ServiceStatus::Received);
        assert_eq!(compute_status(3, 0, true), ServiceStatus::InProgress);
        assert_eq!(compute_status(3, 1, true), ServiceStatus::PartiallyDelivered);
        assert_eq!(compute_status(3, 3, true), ServiceStatus::Delivered);
        // Over-delivery still reads as delivered
        assert_eq!(compute_status(3, 4, false), ServiceStatus::Delivered);
    }

    #[test]
    fn empty_order_is_never_delivered() {
        assert_eq!(compute_status(0, 0, false), ServiceStatus::Received);
    }
}
