pub mod barcode;
pub mod common;
pub mod customers;
pub mod inventory;
pub mod product_types;
pub mod products;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod service_orders;
pub mod spareparts;
pub mod technicians;
pub mod tracking;
pub mod uploads;
pub mod vendors;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    storage::{BlobStorage, LocalBlobStorage},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<crate::services::products::ProductService>,
    pub product_types: Arc<crate::services::product_types::ProductTypeService>,
    pub spareparts: Arc<crate::services::spareparts::SparepartService>,
    pub stock: Arc<crate::services::stock::StockService>,
    pub purchases: Arc<crate::services::purchases::PurchaseService>,
    pub inventory: Arc<crate::services::inventory::InventoryService>,
    pub sales: Arc<crate::services::sales::SaleService>,
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub vendors: Arc<crate::services::vendors::VendorService>,
    pub service_orders: Arc<crate::services::service_orders::ServiceOrderService>,
    pub technicians: Arc<crate::services::technicians::TechnicianService>,
    pub tracking: Arc<crate::services::tracking::TrackingService>,
    pub reports: Arc<crate::services::reports::ReportService>,
    pub barcode: Arc<crate::services::barcode::BarcodeLookupService>,
    pub storage: Arc<dyn BlobStorage>,
}

impl AppServices {
    /// Build the service container shared by every handler.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let products = Arc::new(crate::services::products::ProductService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let product_types = Arc::new(crate::services::product_types::ProductTypeService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let spareparts = Arc::new(crate::services::spareparts::SparepartService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let stock = Arc::new(crate::services::stock::StockService::new(db_pool.clone()));
        let purchases = Arc::new(crate::services::purchases::PurchaseService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let inventory = Arc::new(crate::services::inventory::InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let sales = Arc::new(crate::services::sales::SaleService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let customers = Arc::new(crate::services::customers::CustomerService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let vendors = Arc::new(crate::services::vendors::VendorService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let service_orders = Arc::new(crate::services::service_orders::ServiceOrderService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let technicians = Arc::new(crate::services::technicians::TechnicianService::new(
            db_pool.clone(),
            event_sender,
        ));
        let tracking = Arc::new(crate::services::tracking::TrackingService::new(
            db_pool.clone(),
        ));
        let reports = Arc::new(crate::services::reports::ReportService::new(
            db_pool,
            (*inventory).clone(),
            (*stock).clone(),
        ));
        let barcode = Arc::new(crate::services::barcode::BarcodeLookupService::new(
            config.barcode_lookup_url.clone(),
        ));
        let storage: Arc<dyn BlobStorage> =
            Arc::new(LocalBlobStorage::new(config.upload_dir.clone()));

        Self {
            products,
            product_types,
            spareparts,
            stock,
            purchases,
            inventory,
            sales,
            customers,
            vendors,
            service_orders,
            technicians,
            tracking,
            reports,
            barcode,
            storage,
        }
    }
}
