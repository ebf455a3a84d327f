use super::common::{
    created_response, document_url, map_service_error, no_content_response, success_response,
    validate_input, PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    entities::ServiceStatus,
    errors::ApiError,
    handlers::AppState,
    services::service_orders::{
        CreateDeliveryInput, CreateServiceOrderInput, RecordPartUsageInput, ServiceItemInput,
        ServiceOrderDetails, UpdateServiceOrderInput,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize)]
pub struct ServiceItemRequest {
    pub serial_no: String,
    pub complaint: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceOrderRequest {
    pub vendor_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub challan_no: String,
    pub received_date: NaiveDate,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<ServiceItemRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateServiceOrderRequest {
    pub vendor_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub challan_no: Option<String>,
    pub received_date: Option<NaiveDate>,
    pub document_path: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPartUsageRequest {
    pub sparepart_id: Uuid,
    pub quantity: i32,
    pub serial_no: Option<String>,
    pub diagnosis: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeliveryRequest {
    #[validate(length(min = 1, max = 100))]
    pub challan_no: String,
    pub delivery_date: NaiveDate,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one serial is required"))]
    pub serials: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub vendor_id: Option<Uuid>,
    pub status: Option<ServiceStatus>,
}

/// Service order details plus the rewritten document URL.
#[derive(Debug, Serialize)]
pub struct ServiceOrderResponse {
    #[serde(flatten)]
    pub details: ServiceOrderDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

fn to_response(details: ServiceOrderDetails, state: &AppState) -> ServiceOrderResponse {
    let document_url = document_url(
        &state.config.public_base_url,
        details.order.document_path.as_deref(),
    );
    ServiceOrderResponse {
        details,
        document_url,
    }
}

async fn create_service_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateServiceOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateServiceOrderInput {
        vendor_id: payload.vendor_id,
        challan_no: payload.challan_no,
        received_date: payload.received_date,
        document_path: payload.document_path,
        notes: payload.notes,
        items: payload
            .items
            .into_iter()
            .map(|item| ServiceItemInput {
                serial_no: item.serial_no,
                complaint: item.complaint,
            })
            .collect(),
    };

    let details = state
        .services
        .service_orders
        .create_service_order(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Service order created: {}", details.order.id);
    Ok(created_response(to_response(details, &state)))
}

async fn get_service_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state
        .services
        .service_orders
        .get_service_order(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(to_response(details, &state)))
}

async fn update_service_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateServiceOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateServiceOrderInput {
        vendor_id: payload.vendor_id,
        challan_no: payload.challan_no,
        received_date: payload.received_date,
        document_path: payload.document_path,
        notes: payload.notes,
    };

    let details = state
        .services
        .service_orders
        .update_service_order(order_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(to_response(details, &state)))
}

async fn delete_service_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .service_orders
        .delete_service_order(order_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Service order deleted: {}", order_id);
    Ok(no_content_response())
}

async fn list_service_orders(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .service_orders
        .list_service_orders(
            filter.vendor_id,
            filter.status,
            pagination.page,
            pagination.per_page,
        )
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Record spare parts consumed repairing one intake item
async fn record_part_usage(
    State(state): State<AppState>,
    user: AuthUser,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RecordPartUsageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = RecordPartUsageInput {
        sparepart_id: payload.sparepart_id,
        quantity: payload.quantity,
        serial_no: payload.serial_no,
        diagnosis: payload.diagnosis,
    };

    let usage = state
        .services
        .service_orders
        .record_part_usage(order_id, item_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(usage))
}

/// Hand repaired serials back to the vendor
async fn create_delivery(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<CreateDeliveryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateDeliveryInput {
        challan_no: payload.challan_no,
        delivery_date: payload.delivery_date,
        document_path: payload.document_path,
        notes: payload.notes,
        serials: payload.serials,
    };

    let details = state
        .services
        .service_orders
        .create_delivery(order_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Delivery recorded for service order {}", order_id);
    Ok(created_response(to_response(details, &state)))
}

pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    let read = Router::new()
        .route("/", get(list_service_orders))
        .route("/:id", get(get_service_order))
        .with_permission(perm::SERVICE_READ);

    let manage = Router::new()
        .route("/", post(create_service_order))
        .route("/:id", put(update_service_order))
        .route("/:id", delete(delete_service_order))
        .route("/:id/items/:item_id/usage", post(record_part_usage))
        .route("/:id/deliveries", post(create_delivery))
        .with_permission(perm::SERVICE_MANAGE);

    read.merge(manage)
}
