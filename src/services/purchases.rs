use crate::{
    db::DbPool,
    entities::{sparepart, sparepart_purchase, sparepart_purchase_item, vendor},
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

/// Service for spare-part purchases.
#[derive(Clone)]
pub struct PurchaseService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

/// One requested purchase line. Serial-tracked parts supply either an
/// explicit serial list or a from/to range that is expanded into one
/// row per serial; counted parts supply a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseItemInput {
    pub sparepart_id: Uuid,
    pub quantity: Option<i32>,
    pub unit_price: Option<rust_decimal::Decimal>,
    #[serde(default)]
    pub serials: Vec<String>,
    pub serial_from: Option<String>,
    pub serial_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePurchaseInput {
    pub vendor_id: Uuid,
    pub challan_no: String,
    pub purchase_date: NaiveDate,
    pub received_date: Option<NaiveDate>,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<PurchaseItemInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePurchaseInput {
    pub vendor_id: Option<Uuid>,
    pub challan_no: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    /// When present, replaces the whole item set
    pub items: Option<Vec<PurchaseItemInput>>,
}

/// A purchase with the related rows the UI renders alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseDetails {
    pub purchase: sparepart_purchase::Model,
    pub vendor: Option<vendor::Model>,
    pub items: Vec<sparepart_purchase_item::Model>,
}

/// Expanded line rows derived from one `PurchaseItemInput`.
struct ResolvedLines {
    sparepart_id: Uuid,
    unit_price: Option<rust_decimal::Decimal>,
    /// (quantity, serial)
    rows: Vec<(i32, Option<String>)>,
}

impl PurchaseService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(challan_no = %input.challan_no))]
    pub async fn create_purchase(
        &self,
        input: CreatePurchaseInput,
        actor: Uuid,
    ) -> Result<PurchaseDetails, ServiceError> {
        validate_dates(input.purchase_date, input.received_date)?;
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "A purchase needs at least one item".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start purchase transaction");
            ServiceError::DatabaseError(e)
        })?;

        ensure_vendor_exists(&txn, input.vendor_id).await?;
        ensure_unique_challan(&txn, &input.challan_no, None).await?;

        let purchase_id = Uuid::new_v4();
        let header = sparepart_purchase::ActiveModel {
            id: Set(purchase_id),
            vendor_id: Set(input.vendor_id),
            challan_no: Set(input.challan_no.trim().to_string()),
            purchase_date: Set(input.purchase_date),
            received_date: Set(input.received_date),
            document_path: Set(input.document_path),
            notes: Set(input.notes),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };
        let purchase = header.insert(&txn).await?;

        let items = insert_items(&txn, purchase_id, &input.items, None, actor).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, purchase_id = %purchase_id, "Failed to commit purchase");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender
            .send_or_log(Event::PurchaseCreated(purchase_id))
            .await;

        info!(purchase_id = %purchase_id, items = items.len(), "Purchase created");
        self.load_details(purchase).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_purchase(
        &self,
        purchase_id: Uuid,
        input: UpdatePurchaseInput,
        actor: Uuid,
    ) -> Result<PurchaseDetails, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = find_live_purchase(&txn, purchase_id).await?;

        let purchase_date = input.purchase_date.unwrap_or(existing.purchase_date);
        let received_date = input.received_date.or(existing.received_date);
        validate_dates(purchase_date, received_date)?;

        if let Some(vendor_id) = input.vendor_id {
            ensure_vendor_exists(&txn, vendor_id).await?;
        }
        if let Some(ref challan) = input.challan_no {
            ensure_unique_challan(&txn, challan, Some(purchase_id)).await?;
        }

        let mut active: sparepart_purchase::ActiveModel = existing.into();
        if let Some(vendor_id) = input.vendor_id {
            active.vendor_id = Set(vendor_id);
        }
        if let Some(challan) = input.challan_no {
            active.challan_no = Set(challan.trim().to_string());
        }
        active.purchase_date = Set(purchase_date);
        active.received_date = Set(received_date);
        if let Some(document_path) = input.document_path {
            active.document_path = Set(Some(document_path));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_by = Set(Some(actor));
        let updated = active.update(&txn).await?;

        if let Some(ref new_items) = input.items {
            if new_items.is_empty() {
                return Err(ServiceError::ValidationError(
                    "A purchase needs at least one item".into(),
                ));
            }
            // Replace the item set: retire old rows, insert the new ones.
            // Serial checks exclude rows of the purchase being updated.
            let now = Utc::now();
            let old_items = sparepart_purchase_item::Entity::find()
                .filter(sparepart_purchase_item::Column::PurchaseId.eq(purchase_id))
                .filter(sparepart_purchase_item::Column::DeletedAt.is_null())
                .all(&txn)
                .await?;
            for item in old_items {
                let mut item_active: sparepart_purchase_item::ActiveModel = item.into();
                item_active.deleted_at = Set(Some(now));
                item_active.deleted_by = Set(Some(actor));
                item_active.update(&txn).await?;
            }

            insert_items(&txn, purchase_id, new_items, Some(purchase_id), actor).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PurchaseUpdated(purchase_id))
            .await;

        self.load_details(updated).await
    }

    /// Soft-delete the header and every live item with it.
    #[instrument(skip(self))]
    pub async fn delete_purchase(&self, purchase_id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = find_live_purchase(&txn, purchase_id).await?;
        let now = Utc::now();

        let items = sparepart_purchase_item::Entity::find()
            .filter(sparepart_purchase_item::Column::PurchaseId.eq(purchase_id))
            .filter(sparepart_purchase_item::Column::DeletedAt.is_null())
            .all(&txn)
            .await?;
        for item in items {
            let mut active: sparepart_purchase_item::ActiveModel = item.into();
            active.deleted_at = Set(Some(now));
            active.deleted_by = Set(Some(actor));
            active.update(&txn).await?;
        }

        let mut active: sparepart_purchase::ActiveModel = existing.into();
        active.deleted_at = Set(Some(now));
        active.deleted_by = Set(Some(actor));
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PurchaseDeleted(purchase_id))
            .await;

        info!("Soft-deleted purchase: {}", purchase_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_purchase(&self, purchase_id: Uuid) -> Result<PurchaseDetails, ServiceError> {
        let purchase = find_live_purchase(&*self.db, purchase_id).await?;
        self.load_details(purchase).await
    }

    #[instrument(skip(self))]
    pub async fn list_purchases(
        &self,
        vendor_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<sparepart_purchase::Model>, u64), ServiceError> {
        let mut query = sparepart_purchase::Entity::find()
            .filter(sparepart_purchase::Column::DeletedAt.is_null())
            .order_by_desc(sparepart_purchase::Column::PurchaseDate);
        if let Some(vid) = vendor_id {
            query = query.filter(sparepart_purchase::Column::VendorId.eq(vid));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn load_details(
        &self,
        purchase: sparepart_purchase::Model,
    ) -> Result<PurchaseDetails, ServiceError> {
        let vendor = vendor::Entity::find_by_id(purchase.vendor_id)
            .one(&*self.db)
            .await?;
        let items = sparepart_purchase_item::Entity::find()
            .filter(sparepart_purchase_item::Column::PurchaseId.eq(purchase.id))
            .filter(sparepart_purchase_item::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;
        Ok(PurchaseDetails {
            purchase,
            vendor,
            items,
        })
    }
}

fn validate_dates(
    purchase_date: NaiveDate,
    received_date: Option<NaiveDate>,
) -> Result<(), ServiceError> {
    if let Some(received) = received_date {
        if received < purchase_date {
            return Err(ServiceError::ValidationError(format!(
                "received_date {} is before purchase_date {}",
                received, purchase_date
            )));
        }
    }
    Ok(())
}

async fn ensure_vendor_exists<C: ConnectionTrait>(db: &C, vendor_id: Uuid) -> Result<(), ServiceError> {
    vendor::Entity::find_by_id(vendor_id)
        .filter(vendor::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("Vendor with ID {} not found", vendor_id))
        })?;
    Ok(())
}

async fn find_live_purchase<C: ConnectionTrait>(
    db: &C,
    purchase_id: Uuid,
) -> Result<sparepart_purchase::Model, ServiceError> {
    sparepart_purchase::Entity::find_by_id(purchase_id)
        .filter(sparepart_purchase::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Purchase with ID {} not found", purchase_id))
        })
}

/// Challan numbers are unique among non-deleted purchases, excluding
/// the purchase being updated.
async fn ensure_unique_challan<C: ConnectionTrait>(
    db: &C,
    challan_no: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = sparepart_purchase::Entity::find()
        .filter(sparepart_purchase::Column::ChallanNo.eq(challan_no.trim()))
        .filter(sparepart_purchase::Column::DeletedAt.is_null());
    if let Some(id) = exclude_id {
        query = query.filter(sparepart_purchase::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "Challan number '{}' is already used by another purchase",
            challan_no.trim()
        )));
    }
    Ok(())
}

/// Turn one request line into stored rows, expanding serial ranges.
fn resolve_lines(input: &PurchaseItemInput) -> Result<ResolvedLines, ServiceError> {
    let mut serial_list: Vec<String> = input
        .serials
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    match (&input.serial_from, &input.serial_to) {
        (Some(from), Some(to)) => {
            let expanded = serials::expand_range(from, to)
                .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
            serial_list.extend(expanded);
        }
        (None, None) => {}
        _ => {
            return Err(ServiceError::ValidationError(
                "serial_from and serial_to must be provided together".into(),
            ));
        }
    }

    let rows = if serial_list.is_empty() {
        let quantity = input.quantity.ok_or_else(|| {
            ServiceError::ValidationError(
                "Either a quantity or serial numbers must be provided".into(),
            )
        })?;
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Item quantity must be positive".into(),
            ));
        }
        vec![(quantity, None)]
    } else {
        serial_list
            .into_iter()
            .map(|serial| (1, Some(serial)))
            .collect()
    };

    Ok(ResolvedLines {
        sparepart_id: input.sparepart_id,
        unit_price: input.unit_price,
        rows,
    })
}

/// Insert the line rows for a purchase, rejecting the whole batch if
/// any derived serial already exists for the same part among
/// non-deleted items (normalized comparison).
async fn insert_items<C: ConnectionTrait>(
    txn: &C,
    purchase_id: Uuid,
    inputs: &[PurchaseItemInput],
    exclude_purchase: Option<Uuid>,
    actor: Uuid,
) -> Result<Vec<sparepart_purchase_item::Model>, ServiceError> {
    let mut created = Vec::new();
    let mut batch_seen: HashSet<(Uuid, String)> = HashSet::new();

    for input in inputs {
        let part = sparepart::Entity::find_by_id(input.sparepart_id)
            .filter(sparepart::Column::DeletedAt.is_null())
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Spare part with ID {} not found",
                    input.sparepart_id
                ))
            })?;

        let lines = resolve_lines(input)?;

        if part.is_serial_tracked() && lines.rows.iter().any(|(_, serial)| serial.is_none()) {
            return Err(ServiceError::ValidationError(format!(
                "Part '{}' is serial-tracked; provide serial numbers or a serial range",
                part.name
            )));
        }

        // Existing serials for this part, normalized for comparison
        let mut existing_query = sparepart_purchase_item::Entity::find()
            .filter(sparepart_purchase_item::Column::SparepartId.eq(lines.sparepart_id))
            .filter(sparepart_purchase_item::Column::DeletedAt.is_null())
            .filter(sparepart_purchase_item::Column::SerialNo.is_not_null());
        if let Some(exclude) = exclude_purchase {
            existing_query = existing_query
                .filter(sparepart_purchase_item::Column::PurchaseId.ne(exclude));
        }
        let existing: HashSet<String> = existing_query
            .all(txn)
            .await?
            .into_iter()
            .filter_map(|item| item.serial_no)
            .map(|s| serials::normalize(&s))
            .collect();

        for (quantity, serial) in &lines.rows {
            if let Some(serial) = serial {
                let key = (lines.sparepart_id, serials::normalize(serial));
                if existing.contains(&key.1) {
                    return Err(ServiceError::Conflict(format!(
                        "Serial '{}' already exists for part '{}'",
                        serial, part.name
                    )));
                }
                if !batch_seen.insert(key) {
                    return Err(ServiceError::Conflict(format!(
                        "Serial '{}' appears more than once in this purchase",
                        serial
                    )));
                }
            }

            let model = sparepart_purchase_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_id: Set(purchase_id),
                sparepart_id: Set(lines.sparepart_id),
                quantity: Set(*quantity),
                unit_price: Set(lines.unit_price),
                serial_no: Set(serial.clone()),
                created_by: Set(Some(actor)),
                updated_by: Set(Some(actor)),
                deleted_at: Set(None),
                deleted_by: Set(None),
                ..Default::default()
            };
            created.push(model.insert(txn).await?);
        }
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn received_before_purchase_is_rejected() {
        let purchase = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let received = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        assert!(validate_dates(purchase, Some(received)).is_err());
        assert!(validate_dates(purchase, Some(purchase)).is_ok());
        assert!(validate_dates(purchase, None).is_ok());
    }

    #[test]
    fn range_input_expands_to_one_row_per_serial() {
        let input = PurchaseItemInput {
            sparepart_id: Uuid::new_v4(),
            quantity: None,
            unit_price: None,
            serials: vec![],
            serial_from: Some("PCB-010".into()),
            serial_to: Some("PCB-012".into()),
        };
        let lines = resolve_lines(&input).unwrap();
        let serials: Vec<_> = lines
            .rows
            .iter()
            .map(|(q, s)| (*q, s.clone().unwrap()))
            .collect();
        assert_eq!(
            serials,
            vec![
                (1, "PCB-010".to_string()),
                (1, "PCB-011".to_string()),
                (1, "PCB-012".to_string())
            ]
        );
    }

    #[test]
    fn quantity_line_without_serials_passes_through() {
        let input = PurchaseItemInput {
            sparepart_id: Uuid::new_v4(),
            quantity: Some(25),
            unit_price: Some(dec!(12.50)),
            serials: vec![],
            serial_from: None,
            serial_to: None,
        };
        let lines = resolve_lines(&input).unwrap();
        assert_eq!(lines.rows, vec![(25, None)]);
        assert_eq!(lines.unit_price, Some(dec!(12.50)));
    }

    #[test]
    fn half_open_range_is_invalid() {
        let input = PurchaseItemInput {
            sparepart_id: Uuid::new_v4(),
            quantity: None,
            unit_price: None,
            serials: vec![],
            serial_from: Some("PCB-010".into()),
            serial_to: None,
        };
        assert!(resolve_lines(&input).is_err());
    }

    #[test]
    fn missing_quantity_and_serials_is_invalid() {
        let input = PurchaseItemInput {
            sparepart_id: Uuid::new_v4(),
            quantity: None,
            unit_price: None,
            serials: vec![],
            serial_from: None,
            serial_to: None,
        };
        assert!(resolve_lines(&input).is_err());
    }
}
