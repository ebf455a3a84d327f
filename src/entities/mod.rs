pub mod contact_person;
pub mod customer;
pub mod inventory_unit;
pub mod product;
pub mod product_type;
pub mod sale;
pub mod sale_item;
pub mod service_delivery;
pub mod service_delivery_item;
pub mod service_order;
pub mod service_order_item;
pub mod service_part_usage;
pub mod sparepart;
pub mod sparepart_purchase;
pub mod sparepart_purchase_item;
pub mod technician;
pub mod testing;
pub mod vendor;

pub use inventory_unit::TestedStatus;
pub use service_order::ServiceStatus;
