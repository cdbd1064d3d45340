use crate::dtos::{
    AccessEventResponse, CreateShareRequest, CreateShareResponse, GrantSummary, ListSharesParams,
};
use crate::middleware::OwnerId;
use crate::startup::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use service_core::error::AppError;
use validator::Validate;

pub async fn create_share(
    State(state): State<AppState>,
    owner: OwnerId,
    Json(req): Json<CreateShareRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let issued = state
        .issuer
        .create(&owner.0, req)
        .await
        .map_err(AppError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateShareResponse {
            token: issued.token,
            share_url: issued.share_url,
            expires_at: issued.grant.expires_at,
        }),
    ))
}

pub async fn list_shares(
    State(state): State<AppState>,
    owner: OwnerId,
    Query(params): Query<ListSharesParams>,
) -> Result<impl IntoResponse, AppError> {
    let grants = state
        .grants
        .find_by_owner(&owner.0, params.profile_id.as_deref())
        .await
        .map_err(AppError::from)?;

    let now = Utc::now();
    let summaries: Vec<GrantSummary> = grants
        .into_iter()
        .map(|grant| GrantSummary::from_grant(grant, now))
        .collect();

    Ok(Json(summaries))
}

pub async fn list_share_events(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(grant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let grant = state
        .grants
        .find_by_id(&grant_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("share {} not found", grant_id)))?;

    if grant.created_by != owner.0 {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "you did not create this share"
        )));
    }

    let events = state
        .grants
        .events_for_grant(&grant_id)
        .await
        .map_err(AppError::from)?;

    let responses: Vec<AccessEventResponse> =
        events.into_iter().map(AccessEventResponse::from).collect();

    Ok(Json(responses))
}

pub async fn revoke_share(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(grant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .revocation
        .deactivate(&owner.0, &grant_id)
        .await
        .map_err(AppError::from)?;

    Ok(StatusCode::NO_CONTENT)
}
