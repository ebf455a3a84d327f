use super::common::{
    created_response, document_url, map_service_error, no_content_response, success_response,
    validate_input, PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::AppState,
    services::purchases::{
        CreatePurchaseInput, PurchaseDetails, PurchaseItemInput, UpdatePurchaseInput,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct PurchaseItemRequest {
    pub sparepart_id: Uuid,
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub serials: Vec<String>,
    pub serial_from: Option<String>,
    pub serial_to: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseRequest {
    pub vendor_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub challan_no: String,
    pub purchase_date: NaiveDate,
    pub received_date: Option<NaiveDate>,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<PurchaseItemRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePurchaseRequest {
    pub vendor_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub challan_no: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    pub items: Option<Vec<PurchaseItemRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub vendor_id: Option<Uuid>,
}

/// Purchase details plus the rewritten document URL.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    #[serde(flatten)]
    pub details: PurchaseDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

fn to_response(details: PurchaseDetails, state: &AppState) -> PurchaseResponse {
    let document_url = document_url(
        &state.config.public_base_url,
        details.purchase.document_path.as_deref(),
    );
    PurchaseResponse {
        details,
        document_url,
    }
}

fn to_item_inputs(items: Vec<PurchaseItemRequest>) -> Vec<PurchaseItemInput> {
    items
        .into_iter()
        .map(|item| PurchaseItemInput {
            sparepart_id: item.sparepart_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            serials: item.serials,
            serial_from: item.serial_from,
            serial_to: item.serial_to,
        })
        .collect()
}

async fn create_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreatePurchaseInput {
        vendor_id: payload.vendor_id,
        challan_no: payload.challan_no,
        purchase_date: payload.purchase_date,
        received_date: payload.received_date,
        document_path: payload.document_path,
        notes: payload.notes,
        items: to_item_inputs(payload.items),
    };

    let details = state
        .services
        .purchases
        .create_purchase(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Purchase created: {}", details.purchase.id);
    Ok(created_response(to_response(details, &state)))
}

async fn get_purchase(
    State(state): State<AppState>,
    Path(purchase_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state
        .services
        .purchases
        .get_purchase(purchase_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(to_response(details, &state)))
}

async fn update_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Path(purchase_id): Path<Uuid>,
    Json(payload): Json<UpdatePurchaseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdatePurchaseInput {
        vendor_id: payload.vendor_id,
        challan_no: payload.challan_no,
        purchase_date: payload.purchase_date,
        received_date: payload.received_date,
        document_path: payload.document_path,
        notes: payload.notes,
        items: payload.items.map(to_item_inputs),
    };

    let details = state
        .services
        .purchases
        .update_purchase(purchase_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Purchase updated: {}", purchase_id);
    Ok(success_response(to_response(details, &state)))
}

async fn delete_purchase(
    State(state): State<AppState>,
    user: AuthUser,
    Path(purchase_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .purchases
        .delete_purchase(purchase_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Purchase deleted: {}", purchase_id);
    Ok(no_content_response())
}

async fn list_purchases(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .purchases
        .list_purchases(filter.vendor_id, pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    let read = Router::new()
        .route("/", get(list_purchases))
        .route("/:id", get(get_purchase))
        .with_permission(perm::PURCHASES_READ);

    let manage = Router::new()
        .route("/", post(create_purchase))
        .route("/:id", put(update_purchase))
        .route("/:id", delete(delete_purchase))
        .with_permission(perm::PURCHASES_MANAGE);

    read.merge(manage)
}
