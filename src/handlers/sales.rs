use super::common::{
    created_response, document_url, map_service_error, no_content_response, success_response,
    validate_input, PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::AppState,
    services::sales::{CreateSaleInput, SaleDetails, UpdateSaleInput},
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

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSaleRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub invoice_no: String,
    #[validate(length(min = 1, max = 100))]
    pub challan_no: Option<String>,
    pub sale_date: NaiveDate,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "at least one serial is required"))]
    pub serials: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSaleRequest {
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub invoice_no: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub challan_no: Option<String>,
    pub sale_date: Option<NaiveDate>,
    pub document_path: Option<String>,
    pub notes: Option<String>,
    pub serials: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub customer_id: Option<Uuid>,
}

/// Sale details plus the rewritten document URL.
#[derive(Debug, Serialize)]
pub struct SaleResponse {
    #[serde(flatten)]
    pub details: SaleDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
}

fn to_response(details: SaleDetails, state: &AppState) -> SaleResponse {
    let document_url = document_url(
        &state.config.public_base_url,
        details.sale.document_path.as_deref(),
    );
    SaleResponse {
        details,
        document_url,
    }
}

async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateSaleInput {
        customer_id: payload.customer_id,
        invoice_no: payload.invoice_no,
        challan_no: payload.challan_no,
        sale_date: payload.sale_date,
        document_path: payload.document_path,
        notes: payload.notes,
        serials: payload.serials,
    };

    let details = state
        .services
        .sales
        .create_sale(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Sale created: {}", details.sale.id);
    Ok(created_response(to_response(details, &state)))
}

async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state
        .services
        .sales
        .get_sale(sale_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(to_response(details, &state)))
}

async fn update_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sale_id): Path<Uuid>,
    Json(payload): Json<UpdateSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateSaleInput {
        customer_id: payload.customer_id,
        invoice_no: payload.invoice_no,
        challan_no: payload.challan_no,
        sale_date: payload.sale_date,
        document_path: payload.document_path,
        notes: payload.notes,
        serials: payload.serials,
    };

    let details = state
        .services
        .sales
        .update_sale(sale_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Sale updated: {}", sale_id);
    Ok(success_response(to_response(details, &state)))
}

async fn delete_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sale_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .sales
        .delete_sale(sale_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Sale deleted: {}", sale_id);
    Ok(no_content_response())
}

async fn list_sales(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .sales
        .list_sales(filter.customer_id, pagination.page, pagination.per_page)
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
        .route("/", get(list_sales))
        .route("/:id", get(get_sale))
        .with_permission(perm::SALES_READ);

    let manage = Router::new()
        .route("/", post(create_sale))
        .route("/:id", put(update_sale))
        .route("/:id", delete(delete_sale))
        .with_permission(perm::SALES_MANAGE);

    read.merge(manage)
}
