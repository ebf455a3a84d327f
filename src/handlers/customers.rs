use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::AppState,
    services::customers::{CreateCustomerInput, UpdateCustomerInput},
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
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub search: Option<String>,
}

async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateCustomerInput {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
    };

    let customer = state
        .services
        .customers
        .create_customer(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Customer created: {}", customer.id);
    Ok(created_response(customer))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state
        .services
        .customers
        .get_customer(customer_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(customer))
}

async fn update_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateCustomerInput {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
    };

    let customer = state
        .services
        .customers
        .update_customer(customer_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(customer))
}

async fn delete_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .customers
        .delete_customer(customer_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Customer deleted: {}", customer_id);
    Ok(no_content_response())
}

async fn list_customers(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .customers
        .list_customers(pagination.page, pagination.per_page, filter.search)
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
        .route("/", get(list_customers))
        .route("/:id", get(get_customer))
        .with_permission(perm::CUSTOMERS_READ);

    let manage = Router::new()
        .route("/", post(create_customer))
        .route("/:id", put(update_customer))
        .route("/:id", delete(delete_customer))
        .with_permission(perm::CUSTOMERS_MANAGE);

    read.merge(manage)
}
