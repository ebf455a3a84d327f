use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::AppState,
    services::product_types::{CreateProductTypeInput, UpdateProductTypeInput},
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
pub struct CreateProductTypeRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductTypeRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub product_id: Option<Uuid>,
}

async fn create_product_type(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductTypeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateProductTypeInput {
        product_id: payload.product_id,
        name: payload.name,
        description: payload.description,
    };

    let product_type = state
        .services
        .product_types
        .create_product_type(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Product type created: {}", product_type.id);
    Ok(created_response(product_type))
}

async fn get_product_type(
    State(state): State<AppState>,
    Path(type_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product_type = state
        .services
        .product_types
        .get_product_type(type_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product_type))
}

async fn update_product_type(
    State(state): State<AppState>,
    user: AuthUser,
    Path(type_id): Path<Uuid>,
    Json(payload): Json<UpdateProductTypeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateProductTypeInput {
        name: payload.name,
        description: payload.description,
    };

    let product_type = state
        .services
        .product_types
        .update_product_type(type_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product_type))
}

async fn delete_product_type(
    State(state): State<AppState>,
    user: AuthUser,
    Path(type_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .product_types
        .delete_product_type(type_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

async fn list_product_types(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .product_types
        .list_product_types(filter.product_id, pagination.page, pagination.per_page)
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
        .route("/", get(list_product_types))
        .route("/:id", get(get_product_type))
        .with_permission(perm::PRODUCTS_READ);

    let manage = Router::new()
        .route("/", post(create_product_type))
        .route("/:id", put(update_product_type))
        .route("/:id", delete(delete_product_type))
        .with_permission(perm::PRODUCTS_MANAGE);

    read.merge(manage)
}
