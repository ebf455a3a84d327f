use crate::{
    db::DbPool,
    entities::{customer, inventory_unit, sale, sale_item, TestedStatus},
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
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Service for customer sales.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleInput {
    pub customer_id: Uuid,
    pub invoice_no: String,
    pub challan_no: Option<String>,
    pub sale_date: NaiveDate,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    /// Serials of the units being sold
    pub serials: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSaleInput {
    pub customer_id: Option<Uuid>,
    pub invoice_no: Option<String>,
    pub challan_no: Option<String>,
    pub sale_date: Option<NaiveDate>,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    /// When present, replaces the whole item set
    pub serials: Option<Vec<String>>,
}

/// A sale with the related rows the UI renders alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetails {
    pub sale: sale::Model,
    pub customer: Option<customer::Model>,
    pub items: Vec<sale_item::Model>,
}

impl SaleService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create a sale; every serial must identify a live PASS-tested unit
    /// that is not already on another active sale, or the whole sale is
    /// rejected.
    #[instrument(skip(self, input), fields(invoice_no = %input.invoice_no))]
    pub async fn create_sale(
        &self,
        input: CreateSaleInput,
        actor: Uuid,
    ) -> Result<SaleDetails, ServiceError> {
        if input.serials.is_empty() {
            return Err(ServiceError::ValidationError(
                "A sale needs at least one serial".into(),
            ));
        }

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start sale transaction");
            ServiceError::DatabaseError(e)
        })?;

        ensure_customer_exists(&txn, input.customer_id).await?;
        ensure_unique_invoice(&txn, &input.invoice_no, None).await?;
        if let Some(ref challan) = input.challan_no {
            ensure_unique_challan(&txn, challan, None).await?;
        }

        let sale_id = Uuid::new_v4();
        let header = sale::ActiveModel {
            id: Set(sale_id),
            customer_id: Set(input.customer_id),
            invoice_no: Set(input.invoice_no.trim().to_string()),
            challan_no: Set(input.challan_no.map(|c| c.trim().to_string())),
            sale_date: Set(input.sale_date),
            document_path: Set(input.document_path),
            notes: Set(input.notes),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };
        let sale = header.insert(&txn).await?;

        let items = insert_items(&txn, sale_id, &input.serials, None, actor).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, sale_id = %sale_id, "Failed to commit sale");
            ServiceError::DatabaseError(e)
        })?;

        self.event_sender
            .send_or_log(Event::SaleCreated(sale_id))
            .await;

        info!(sale_id = %sale_id, items = items.len(), "Sale created");
        self.load_details(sale).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_sale(
        &self,
        sale_id: Uuid,
        input: UpdateSaleInput,
        actor: Uuid,
    ) -> Result<SaleDetails, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = find_live_sale(&txn, sale_id).await?;

        if let Some(customer_id) = input.customer_id {
            ensure_customer_exists(&txn, customer_id).await?;
        }
        if let Some(ref invoice) = input.invoice_no {
            ensure_unique_invoice(&txn, invoice, Some(sale_id)).await?;
        }
        if let Some(ref challan) = input.challan_no {
            ensure_unique_challan(&txn, challan, Some(sale_id)).await?;
        }

        let mut active: sale::ActiveModel = existing.into();
        if let Some(customer_id) = input.customer_id {
            active.customer_id = Set(customer_id);
        }
        if let Some(invoice) = input.invoice_no {
            active.invoice_no = Set(invoice.trim().to_string());
        }
        if let Some(challan) = input.challan_no {
            active.challan_no = Set(Some(challan.trim().to_string()));
        }
        if let Some(sale_date) = input.sale_date {
            active.sale_date = Set(sale_date);
        }
        if let Some(document_path) = input.document_path {
            active.document_path = Set(Some(document_path));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_by = Set(Some(actor));
        let updated = active.update(&txn).await?;

        if let Some(ref new_serials) = input.serials {
            if new_serials.is_empty() {
                return Err(ServiceError::ValidationError(
                    "A sale needs at least one serial".into(),
                ));
            }

            let now = Utc::now();
            let old_items = sale_item::Entity::find()
                .filter(sale_item::Column::SaleId.eq(sale_id))
                .filter(sale_item::Column::DeletedAt.is_null())
                .all(&txn)
                .await?;
            for item in old_items {
                let mut item_active: sale_item::ActiveModel = item.into();
                item_active.deleted_at = Set(Some(now));
                item_active.deleted_by = Set(Some(actor));
                item_active.update(&txn).await?;
            }

            insert_items(&txn, sale_id, new_serials, Some(sale_id), actor).await?;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::SaleUpdated(sale_id))
            .await;

        self.load_details(updated).await
    }

    /// Soft-delete the sale and its items, releasing the serials.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, sale_id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = find_live_sale(&txn, sale_id).await?;
        let now = Utc::now();

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .filter(sale_item::Column::DeletedAt.is_null())
            .all(&txn)
            .await?;
        for item in items {
            let mut active: sale_item::ActiveModel = item.into();
            active.deleted_at = Set(Some(now));
            active.deleted_by = Set(Some(actor));
            active.update(&txn).await?;
        }

        let mut active: sale::ActiveModel = existing.into();
        active.deleted_at = Set(Some(now));
        active.deleted_by = Set(Some(actor));
        active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::SaleDeleted(sale_id))
            .await;

        info!("Soft-deleted sale: {}", sale_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<SaleDetails, ServiceError> {
        let sale = find_live_sale(&*self.db, sale_id).await?;
        self.load_details(sale).await
    }

    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        customer_id: Option<Uuid>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<sale::Model>, u64), ServiceError> {
        let mut query = sale::Entity::find()
            .filter(sale::Column::DeletedAt.is_null())
            .order_by_desc(sale::Column::SaleDate);
        if let Some(cid) = customer_id {
            query = query.filter(sale::Column::CustomerId.eq(cid));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn load_details(&self, sale: sale::Model) -> Result<SaleDetails, ServiceError> {
        let customer = customer::Entity::find_by_id(sale.customer_id)
            .one(&*self.db)
            .await?;
        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale.id))
            .filter(sale_item::Column::DeletedAt.is_null())
            .all(&*self.db)
            .await?;
        Ok(SaleDetails {
            sale,
            customer,
            items,
        })
    }
}

async fn ensure_customer_exists<C: ConnectionTrait>(
    db: &C,
    customer_id: Uuid,
) -> Result<(), ServiceError> {
    customer::Entity::find_by_id(customer_id)
        .filter(customer::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("Customer with ID {} not found", customer_id))
        })?;
    Ok(())
}

async fn find_live_sale<C: ConnectionTrait>(
    db: &C,
    sale_id: Uuid,
) -> Result<sale::Model, ServiceError> {
    sale::Entity::find_by_id(sale_id)
        .filter(sale::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Sale with ID {} not found", sale_id)))
}

async fn ensure_unique_invoice<C: ConnectionTrait>(
    db: &C,
    invoice_no: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = sale::Entity::find()
        .filter(sale::Column::InvoiceNo.eq(invoice_no.trim()))
        .filter(sale::Column::DeletedAt.is_null());
    if let Some(id) = exclude_id {
        query = query.filter(sale::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "Invoice number '{}' is already used by another sale",
            invoice_no.trim()
        )));
    }
    Ok(())
}

async fn ensure_unique_challan<C: ConnectionTrait>(
    db: &C,
    challan_no: &str,
    exclude_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = sale::Entity::find()
        .filter(sale::Column::ChallanNo.eq(challan_no.trim()))
        .filter(sale::Column::DeletedAt.is_null());
    if let Some(id) = exclude_id {
        query = query.filter(sale::Column::Id.ne(id));
    }

    if query.one(db).await?.is_some() {
        return Err(ServiceError::Conflict(format!(
            "Challan number '{}' is already used by another sale",
            challan_no.trim()
        )));
    }
    Ok(())
}

/// Resolve each serial to a live PASS-tested unit not already on an
/// active sale, then insert one line per serial.
async fn insert_items<C: ConnectionTrait>(
    txn: &C,
    sale_id: Uuid,
    requested: &[String],
    exclude_sale: Option<Uuid>,
    actor: Uuid,
) -> Result<Vec<sale_item::Model>, ServiceError> {
    // Live units indexed by normalized serial
    let units: HashMap<String, inventory_unit::Model> = inventory_unit::Entity::find()
        .filter(inventory_unit::Column::DeletedAt.is_null())
        .all(txn)
        .await?
        .into_iter()
        .map(|u| (serials::normalize(&u.serial_no), u))
        .collect();

    // Serials already on an active sale
    let mut taken_query = sale_item::Entity::find()
        .filter(sale_item::Column::DeletedAt.is_null());
    if let Some(exclude) = exclude_sale {
        taken_query = taken_query.filter(sale_item::Column::SaleId.ne(exclude));
    }
    let taken: HashSet<String> = taken_query
        .all(txn)
        .await?
        .into_iter()
        .map(|item| serials::normalize(&item.serial_no))
        .collect();

    let mut batch_seen = HashSet::new();
    let mut created = Vec::with_capacity(requested.len());
    for serial in requested {
        let normalized = serials::normalize(serial);
        if normalized.is_empty() {
            return Err(ServiceError::ValidationError(
                "Empty serial number in sale items".into(),
            ));
        }

        let unit = units.get(&normalized).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "No inventory unit found for serial '{}'",
                serial.trim()
            ))
        })?;

        if unit.tested_status != TestedStatus::Pass {
            return Err(ServiceError::InvalidOperation(format!(
                "Unit '{}' has not passed testing and cannot be sold",
                serial.trim()
            )));
        }

        if taken.contains(&normalized) {
            return Err(ServiceError::Conflict(format!(
                "Serial '{}' is already on another active sale",
                serial.trim()
            )));
        }
        if !batch_seen.insert(normalized) {
            return Err(ServiceError::Conflict(format!(
                "Serial '{}' appears more than once in this sale",
                serial.trim()
            )));
        }

        let model = sale_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            sale_id: Set(sale_id),
            inventory_unit_id: Set(unit.id),
            serial_no: Set(unit.serial_no.clone()),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            deleted_at: Set(None),
            deleted_by: Set(None),
            ..Default::default()
        };
        created.push(model.insert(txn).await?);
    }

    Ok(created)
}
