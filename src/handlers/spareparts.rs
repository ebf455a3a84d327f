use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::AppState,
    services::spareparts::{CreateSparepartInput, UpdateSparepartInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSparepartRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub part_no: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub minimum_stock: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSparepartRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub part_no: Option<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub minimum_stock: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub search: Option<String>,
}

async fn create_sparepart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSparepartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateSparepartInput {
        name: payload.name,
        part_no: payload.part_no,
        unit: payload.unit,
        description: payload.description,
        minimum_stock: payload.minimum_stock,
    };

    let part = state
        .services
        .spareparts
        .create_sparepart(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Spare part created: {}", part.id);
    Ok(created_response(part))
}

async fn get_sparepart(
    State(state): State<AppState>,
    Path(sparepart_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let part = state
        .services
        .spareparts
        .get_sparepart(sparepart_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(part))
}

async fn update_sparepart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sparepart_id): Path<Uuid>,
    Json(payload): Json<UpdateSparepartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateSparepartInput {
        name: payload.name,
        part_no: payload.part_no,
        unit: payload.unit,
        description: payload.description,
        minimum_stock: payload.minimum_stock,
    };

    let part = state
        .services
        .spareparts
        .update_sparepart(sparepart_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(part))
}

async fn delete_sparepart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sparepart_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .spareparts
        .delete_sparepart(sparepart_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

async fn list_spareparts(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .spareparts
        .list_spareparts(pagination.page, pagination.per_page, filter.search)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Stock on hand for every part
async fn availability(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .stock
        .availability_for_all()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

/// Stock on hand for one part, with serials for serial-tracked parts
async fn availability_for(
    State(state): State<AppState>,
    Path(sparepart_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let line = state
        .services
        .stock
        .availability_for(sparepart_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(line))
}

pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    let read = Router::new()
        .route("/", get(list_spareparts))
        .route("/availability", get(availability))
        .route("/:id", get(get_sparepart))
        .route("/:id/availability", get(availability_for))
        .with_permission(perm::SPAREPARTS_READ);

    let manage = Router::new()
        .route("/", post(create_sparepart))
        .route("/:id", put(update_sparepart))
        .route("/:id", delete(delete_sparepart))
        .with_permission(perm::SPAREPARTS_MANAGE);

    read.merge(manage)
}
