use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::AppState,
    services::vendors::{
        CreateContactPersonInput, CreateVendorInput, UpdateContactPersonInput, UpdateVendorInput,
    },
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
pub struct CreateVendorRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVendorRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateContactRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub designation: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContactRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub designation: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub search: Option<String>,
}

async fn create_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateVendorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateVendorInput {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
    };

    let vendor = state
        .services
        .vendors
        .create_vendor(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Vendor created: {}", vendor.id);
    Ok(created_response(vendor))
}

async fn get_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state
        .services
        .vendors
        .get_vendor_with_contacts(vendor_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(details))
}

async fn update_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(vendor_id): Path<Uuid>,
    Json(payload): Json<UpdateVendorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateVendorInput {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
    };

    let vendor = state
        .services
        .vendors
        .update_vendor(vendor_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(vendor))
}

async fn delete_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(vendor_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .vendors
        .delete_vendor(vendor_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    info!("Vendor deleted: {}", vendor_id);
    Ok(no_content_response())
}

async fn list_vendors(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .vendors
        .list_vendors(pagination.page, pagination.per_page, filter.search)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

async fn add_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(vendor_id): Path<Uuid>,
    Json(payload): Json<CreateContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateContactPersonInput {
        name: payload.name,
        designation: payload.designation,
        email: payload.email,
        phone: payload.phone,
    };

    let contact = state
        .services
        .vendors
        .add_contact(vendor_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(contact))
}

async fn update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path((vendor_id, contact_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateContactRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateContactPersonInput {
        name: payload.name,
        designation: payload.designation,
        email: payload.email,
        phone: payload.phone,
    };

    let contact = state
        .services
        .vendors
        .update_contact(vendor_id, contact_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(contact))
}

async fn delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path((vendor_id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .vendors
        .delete_contact(vendor_id, contact_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    let read = Router::new()
        .route("/", get(list_vendors))
        .route("/:id", get(get_vendor))
        .with_permission(perm::VENDORS_READ);

    let manage = Router::new()
        .route("/", post(create_vendor))
        .route("/:id", put(update_vendor))
        .route("/:id", delete(delete_vendor))
        .route("/:id/contacts", post(add_contact))
        .route("/:id/contacts/:contact_id", put(update_contact))
        .route("/:id/contacts/:contact_id", delete(delete_contact))
        .with_permission(perm::VENDORS_MANAGE);

    read.merge(manage)
}
