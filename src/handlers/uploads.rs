use super::common::{created_response, map_service_error};
use crate::{auth::AuthUser, errors::ApiError, handlers::AppState, storage};
use axum::{
    extract::{Multipart, Query, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use tracing::info;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Storage category (e.g. "receipts", "challans", "photos")
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "documents".to_string()
}

/// Persist an uploaded document and return its stored relative path
/// plus the rewritten public URL.
async fn upload_document(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut stored = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart payload: {}", e)))?
    {
        let file_name = field
            .file_name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "file".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;

        if data.is_empty() {
            return Err(ApiError::BadRequest("empty upload".into()));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::BadRequest(format!(
                "upload exceeds the {} byte limit",
                MAX_UPLOAD_BYTES
            )));
        }

        let relative = state
            .services
            .storage
            .store(&query.category, &file_name, data)
            .await
            .map_err(map_service_error)?;

        info!(path = %relative, user = %user.user_id, "document uploaded");

        let url = storage::absolutize(&state.config.public_base_url, &relative);
        stored.push(serde_json::json!({
            "path": relative,
            "url": url,
            "file_name": file_name,
        }));
    }

    if stored.is_empty() {
        return Err(ApiError::BadRequest("no file fields in upload".into()));
    }

    Ok(created_response(serde_json::json!({ "files": stored })))
}

pub fn routes() -> Router<AppState> {
    use crate::auth::{consts as perm, AuthRouterExt};

    Router::new()
        .route("/", post(upload_document))
        .with_permission(perm::UPLOADS_WRITE)
}
