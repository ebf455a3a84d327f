//! Permission string constants used to gate resource routers.

pub const PRODUCTS_READ: &str = "products:read";
pub const PRODUCTS_MANAGE: &str = "products:manage";

pub const SPAREPARTS_READ: &str = "spareparts:read";
pub const SPAREPARTS_MANAGE: &str = "spareparts:manage";

pub const PURCHASES_READ: &str = "purchases:read";
pub const PURCHASES_MANAGE: &str = "purchases:manage";

pub const INVENTORY_READ: &str = "inventory:read";
pub const INVENTORY_MANAGE: &str = "inventory:manage";

pub const TESTING_READ: &str = "testing:read";
pub const TESTING_MANAGE: &str = "testing:manage";

pub const SALES_READ: &str = "sales:read";
pub const SALES_MANAGE: &str = "sales:manage";

pub const CUSTOMERS_READ: &str = "customers:read";
pub const CUSTOMERS_MANAGE: &str = "customers:manage";

pub const VENDORS_READ: &str = "vendors:read";
pub const VENDORS_MANAGE: &str = "vendors:manage";

pub const SERVICE_READ: &str = "service:read";
pub const SERVICE_MANAGE: &str = "service:manage";

pub const TECHNICIANS_READ: &str = "technicians:read";
pub const TECHNICIANS_MANAGE: &str = "technicians:manage";

pub const TRACKING_READ: &str = "tracking:read";
pub const REPORTS_READ: &str = "reports:read";
pub const UPLOADS_WRITE: &str = "uploads:write";
pub const BARCODE_READ: &str = "barcode:read";
