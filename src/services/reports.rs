use crate::{
    db::DbPool,
    entities::{
        customer, product, sale, service_order, sparepart, sparepart_purchase, technician, vendor,
    },
    errors::ServiceError,
    services::inventory::{InventoryService, UnitCounts},
    services::stock::{PartAvailability, StockService},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Dashboard summary: live row counts plus the availability snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub products: u64,
    pub spareparts: u64,
    pub purchases: u64,
    pub sales: u64,
    pub customers: u64,
    pub vendors: u64,
    pub technicians: u64,
    pub service_orders: u64,
    pub inventory: UnitCounts,
    pub stock: Vec<PartAvailability>,
}

/// Service producing the reporting aggregates.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
    inventory: InventoryService,
    stock: StockService,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>, inventory: InventoryService, stock: StockService) -> Self {
        Self {
            db,
            inventory,
            stock,
        }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<SummaryReport, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        let spareparts = sparepart::Entity::find()
            .filter(sparepart::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        let purchases = sparepart_purchase::Entity::find()
            .filter(sparepart_purchase::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        let sales = sale::Entity::find()
            .filter(sale::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        let customers = customer::Entity::find()
            .filter(customer::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        let vendors = vendor::Entity::find()
            .filter(vendor::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        let technicians = technician::Entity::find()
            .filter(technician::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;
        let service_orders = service_order::Entity::find()
            .filter(service_order::Column::DeletedAt.is_null())
            .count(&*self.db)
            .await?;

        let inventory = self.inventory.unit_counts().await?;
        let stock = self.stock.availability_for_all().await?;

        Ok(SummaryReport {
            products,
            spareparts,
            purchases,
            sales,
            customers,
            vendors,
            technicians,
            service_orders,
            inventory,
            stock,
        })
    }
}
