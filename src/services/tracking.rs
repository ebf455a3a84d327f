use crate::{
    db::DbPool,
    entities::{
        inventory_unit, sale, sale_item, service_delivery, service_delivery_item, service_order,
        service_order_item, sparepart_purchase, sparepart_purchase_item, testing,
    },
    errors::ServiceError,
    serials,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// One step in a serial's life.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineEventKind {
    Purchased,
    Assembled,
    Tested,
    Sold,
    ServiceReceived,
    ServiceDelivered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub kind: TimelineEventKind,
    pub occurred_at: DateTime<Utc>,
    /// Related document number (challan/invoice), when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialTimeline {
    /// The serial as requested (trimmed)
    pub serial_no: String,
    pub events: Vec<TimelineEvent>,
}

fn at_midnight(date: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(date.and_hms_opt(0, 0, 0).expect("midnight is valid"), Utc)
}

/// Service assembling the per-serial tracking timeline.
#[derive(Clone)]
pub struct TrackingService {
    db: Arc<DbPool>,
}

impl TrackingService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Chronological events for a device serial across purchase,
    /// assembly, testing, sale, and service. Matching is normalized;
    /// the timeline is 404 when nothing references the serial.
    #[instrument(skip(self))]
    pub async fn timeline_for(&self, serial: &str) -> Result<SerialTimeline, ServiceError> {
        let normalized = serials::normalize(serial);
        if normalized.is_empty() {
            return Err(ServiceError::ValidationError("Empty serial number".into()));
        }

        let mut events: Vec<TimelineEvent> = Vec::new();

        // Purchased (serialized spare parts carry the device serial)
        let purchase_items = sparepart_purchase_item::Entity::find()
            .filter(sparepart_purchase_item::Column::DeletedAt.is_null())
            .filter(sparepart_purchase_item::Column::SerialNo.is_not_null())
            .all(&*self.db)
            .await?;
        for item in purchase_items {
            let Some(ref item_serial) = item.serial_no else {
                continue;
            };
            if serials::normalize(item_serial) != normalized {
                continue;
            }
            let header = sparepart_purchase::Entity::find_by_id(item.purchase_id)
                .filter(sparepart_purchase::Column::DeletedAt.is_null())
                .one(&*self.db)
                .await?;
            if let Some(header) = header {
                events.push(TimelineEvent {
                    kind: TimelineEventKind::Purchased,
                    occurred_at: at_midnight(header.purchase_date),
                    reference: Some(header.challan_no),
                    detail: None,
                });
            }
        }

        // Assembled + tested
        let units = inventory_unit::Entity::find()
            .filter(inventory_unit::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;
        for unit in units.iter().filter(|u| serials::normalize(&u.serial_no) == normalized) {
            events.push(TimelineEvent {
                kind: TimelineEventKind::Assembled,
                occurred_at: unit
                    .assembled_on
                    .map(at_midnight)
                    .unwrap_or(unit.created_at),
                reference: None,
                detail: None,
            });

            let tests = testing::Entity::find()
                .filter(testing::Column::InventoryUnitId.eq(unit.id))
                .filter(testing::Column::DeletedAt.is_null())
                .all(&*self.db)
                .await?;
            for test in tests {
                events.push(TimelineEvent {
                    kind: TimelineEventKind::Tested,
                    occurred_at: test.tested_on,
                    reference: None,
                    detail: Some(test.status.to_string()),
                });
            }
        }

        // Sold
        let sale_items = sale_item::Entity::find()
            .filter(sale_item::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;
        for item in sale_items
            .iter()
            .filter(|i| serials::normalize(&i.serial_no) == normalized)
        {
            let header = sale::Entity::find_by_id(item.sale_id)
                .filter(sale::Column::DeletedAt.is_null())
                .one(&*self.db)
                .await?;
            if let Some(header) = header {
                events.push(TimelineEvent {
                    kind: TimelineEventKind::Sold,
                    occurred_at: at_midnight(header.sale_date),
                    reference: Some(header.invoice_no),
                    detail: None,
                });
            }
        }

        // Service intake + delivery
        let service_items = service_order_item::Entity::find()
            .filter(service_order_item::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;
        for item in service_items
            .iter()
            .filter(|i| serials::normalize(&i.serial_no) == normalized)
        {
            let order = service_order::Entity::find_by_id(item.service_order_id)
                .filter(service_order::Column::DeletedAt.is_null())
                .one(&*self.db)
                .await?;
            if let Some(order) = order {
                events.push(TimelineEvent {
                    kind: TimelineEventKind::ServiceReceived,
                    occurred_at: at_midnight(order.received_date),
                    reference: Some(order.challan_no),
                    detail: item.complaint.clone(),
                });
            }

            let delivery_rows = service_delivery_item::Entity::find()
                .filter(service_delivery_item::Column::ServiceOrderItemId.eq(item.id))
                .filter(service_delivery_item::Column::DeletedAt.is_null())
                .all(&*self.db)
                .await?;
            for row in delivery_rows {
                let delivery = service_delivery::Entity::find_by_id(row.service_delivery_id)
                    .filter(service_delivery::Column::DeletedAt.is_null())
                    .one(&*self.db)
                    .await?;
                if let Some(delivery) = delivery {
                    events.push(TimelineEvent {
                        kind: TimelineEventKind::ServiceDelivered,
                        occurred_at: at_midnight(delivery.delivery_date),
                        reference: Some(delivery.challan_no),
                        detail: None,
                    });
                }
            }
        }

        if events.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No history found for serial '{}'",
                serial.trim()
            )));
        }

        events.sort_by_key(|e| e.occurred_at);

        Ok(SerialTimeline {
            serial_no: serial.trim().to_string(),
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midnight_conversion_is_stable() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(at_midnight(date).to_rfc3339(), "2026-01-15T00:00:00+00:00");
    }
}
