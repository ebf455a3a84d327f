use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    entities::product::BomComponent,
    errors::ApiError,
    handlers::AppState,
    services::products::{CreateProductInput, UpdateProductInput},
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

#[derive(Debug, Deserialize)]
pub struct BomLineRequest {
    pub sparepart_id: Uuid,
    pub required_quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    pub bill_of_materials: Vec<BomLineRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub bill_of_materials: Option<Vec<BomLineRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub search: Option<String>,
}

fn to_components(lines: Vec<BomLineRequest>) -> Vec<BomComponent> {
    lines
        .into_iter()
        .map(|line| BomComponent {
            sparepart_id: line.sparepart_id,
            required_quantity: line.required_quantity,
        })
        .collect()
}

/// Create a new product
async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateProductInput {
        name: payload.name,
        description: payload.description,
        bill_of_materials: to_components(payload.bill_of_materials),
    };

    let product = state
        .services
        .products
        .create_product(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Product created: {}", product.id);
    Ok(created_response(product))
}

/// Get a product with its types
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (product, types) = state
        .services
        .products
        .get_product_with_types(product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "product": product,
        "product_types": types,
    })))
}

/// Update a product
async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateProductInput {
        name: payload.name,
        description: payload.description,
        bill_of_materials: payload.bill_of_materials.map(to_components),
    };

    let product = state
        .services
        .products
        .update_product(product_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Product updated: {}", product_id);
    Ok(success_response(product))
}

/// Soft-delete a product
async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .products
        .delete_product(product_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Product deleted: {}", product_id);
    Ok(no_content_response())
}

/// List products with pagination
async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .products
        .list_products(pagination.page, pagination.per_page, filter.search)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Routes for the product catalog, permission-gated per operation
pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    let read = Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .with_permission(perm::PRODUCTS_READ);

    let manage = Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
        .with_permission(perm::PRODUCTS_MANAGE);

    read.merge(manage)
}
