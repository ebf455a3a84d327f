pub mod barcode;
pub mod customers;
pub mod inventory;
pub mod product_types;
pub mod products;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod service_orders;
pub mod spareparts;
pub mod stock;
pub mod technicians;
pub mod tracking;
pub mod vendors;
