use crate::dtos::SharedDataResponse;
use crate::middleware::ClientMeta;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use service_core::error::AppError;

/// Public token redemption. The only credential is the token itself; every
/// denial reason maps to the same 404 body on the way out.
pub async fn access_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
    meta: ClientMeta,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .access
        .access(&token, &meta)
        .await
        .map_err(AppError::from)?;

    Ok(Json(SharedDataResponse {
        success: true,
        allowed_scopes: view.allowed_scopes,
        data: view.data,
        expires_at: view.expires_at,
        shared_by: view.shared_by,
    }))
}
