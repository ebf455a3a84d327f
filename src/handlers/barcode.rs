use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// Proxy a product lookup to the third-party barcode service
async fn lookup_barcode(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let body = state
        .services
        .barcode
        .lookup(&code)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(body))
}

pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    Router::new()
        .route("/:code", get(lookup_barcode))
        .with_permission(perm::BARCODE_READ)
}
