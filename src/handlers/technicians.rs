use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    auth::AuthUser,
    errors::ApiError,
    handlers::AppState,
    services::technicians::{CreateTechnicianInput, UpdateTechnicianInput},
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTechnicianRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTechnicianRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

async fn create_technician(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTechnicianRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateTechnicianInput {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
    };

    let technician = state
        .services
        .technicians
        .create_technician(input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(technician))
}

async fn get_technician(
    State(state): State<AppState>,
    Path(technician_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let technician = state
        .services
        .technicians
        .get_technician(technician_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(technician))
}

async fn update_technician(
    State(state): State<AppState>,
    user: AuthUser,
    Path(technician_id): Path<Uuid>,
    Json(payload): Json<UpdateTechnicianRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = UpdateTechnicianInput {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
    };

    let technician = state
        .services
        .technicians
        .update_technician(technician_id, input, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(technician))
}

async fn delete_technician(
    State(state): State<AppState>,
    user: AuthUser,
    Path(technician_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .technicians
        .delete_technician(technician_id, user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

async fn list_technicians(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .technicians
        .list_technicians(pagination.page, pagination.per_page)
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
        .route("/", get(list_technicians))
        .route("/:id", get(get_technician))
        .with_permission(perm::TECHNICIANS_READ);

    let manage = Router::new()
        .route("/", post(create_technician))
        .route("/:id", put(update_technician))
        .route("/:id", delete(delete_technician))
        .with_permission(perm::TECHNICIANS_MANAGE);

    read.merge(manage)
}
