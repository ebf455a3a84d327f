use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    entities::TestedStatus,
    errors::ApiError,
    handlers::AppState,
    services::inventory::{AssembleUnitsInput, RecordTestInput, UnitFilter, UpdateUnitInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AssembleUnitsRequest {
    pub product_id: Uuid,
    pub product_type_id: Uuid,
    #[serde(default)]
    pub serials: Vec<String>,
    pub serial_from: Option<String>,
    pub serial_to: Option<String>,
    pub assembled_on: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUnitRequest {
    pub product_type_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub serial_no: Option<String>,
    pub assembled_on: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordTestRequest {
    pub technician_id: Uuid,
    pub status: TestedStatus,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub product_id: Option<Uuid>,
    pub product_type_id: Option<Uuid>,
    pub tested_status: Option<TestedStatus>,
    pub sold: Option<bool>,
}

/// Create assembled units from a serial list or range
async fn assemble_units(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AssembleUnitsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = AssembleUnitsInput {
        product_id: payload.product_id,
        product_type_id: payload.product_type_id,
        serials: payload.serials,
        serial_from: payload.serial_from,
        serial_to: payload.serial_to,
        assembled_on: payload.assembled_on,
        remarks: payload.remarks,
    };

    let units = state
        .services
        .inventory
        .assemble_units(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Assembled {} unit(s)", units.len());
    Ok(created_response(units))
}

async fn get_unit(
    State(state): State<AppState>,
    Path(unit_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state
        .services
        .inventory
        .get_unit(unit_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(details))
}

async fn update_unit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(unit_id): Path<Uuid>,
    Json(payload): Json<UpdateUnitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateUnitInput {
        product_type_id: payload.product_type_id,
        serial_no: payload.serial_no,
        assembled_on: payload.assembled_on,
        remarks: payload.remarks,
    };

    let unit = state
        .services
        .inventory
        .update_unit(unit_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(unit))
}

async fn delete_unit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(unit_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .inventory
        .delete_unit(unit_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Inventory unit deleted: {}", unit_id);
    Ok(no_content_response())
}

async fn list_units(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = UnitFilter {
        product_id: filter.product_id,
        product_type_id: filter.product_type_id,
        tested_status: filter.tested_status,
        sold: filter.sold,
    };

    let (items, total) = state
        .services
        .inventory
        .list_units(filter, pagination.page, pagination.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Per-status unit counts
async fn unit_counts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let counts = state
        .services
        .inventory
        .unit_counts()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(counts))
}

/// Record a test run against a unit
async fn record_test(
    State(state): State<AppState>,
    user: AuthUser,
    Path(unit_id): Path<Uuid>,
    Json(payload): Json<RecordTestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = RecordTestInput {
        technician_id: payload.technician_id,
        status: payload.status,
        remarks: payload.remarks,
    };

    let record = state
        .services
        .inventory
        .record_test(unit_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Test recorded for unit {}", unit_id);
    Ok(created_response(record))
}

/// Testing history for a unit
async fn list_tests(
    State(state): State<AppState>,
    Path(unit_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tests = state
        .services
        .inventory
        .list_tests(unit_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(tests))
}

pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    let read = Router::new()
        .route("/", get(list_units))
        .route("/counts", get(unit_counts))
        .route("/:id", get(get_unit))
        .with_permission(perm::INVENTORY_READ);

    let manage = Router::new()
        .route("/", post(assemble_units))
        .route("/:id", put(update_unit))
        .route("/:id", delete(delete_unit))
        .with_permission(perm::INVENTORY_MANAGE);

    let testing_read = Router::new()
        .route("/:id/testing", get(list_tests))
        .with_permission(perm::TESTING_READ);

    let testing_manage = Router::new()
        .route("/:id/testing", post(record_test))
        .with_permission(perm::TESTING_MANAGE);

    read.merge(manage).merge(testing_read).merge(testing_manage)
}
