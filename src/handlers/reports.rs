use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, handlers::AppState};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

/// Dashboard summary: row counts, unit status counts, stock snapshot
async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .reports
        .summary()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    Router::new()
        .route("/summary", get(summary))
        .with_permission(perm::REPORTS_READ)
}
