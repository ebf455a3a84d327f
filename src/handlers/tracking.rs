use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// Chronological history of a device serial
async fn tracking_timeline(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let timeline = state
        .services
        .tracking
        .timeline_for(&serial)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(timeline))
}

pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    Router::new()
        .route("/:serial", get(tracking_timeline))
        .with_permission(perm::TRACKING_READ)
}
