use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

/// Authenticated owner identity for share management endpoints.
///
/// Extracted from the X-User-ID header propagated by the trusted frontend
/// (BFF). Authentication itself happens upstream; this service only trusts
/// the header on requests that reached it through the signed service mesh.
/// The public access endpoint never uses this extractor: its only
/// credential is the share token.
#[derive(Debug, Clone)]
pub struct OwnerId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner_id = parts
            .headers
            .get("X-User-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing X-User-ID header (required from BFF)"
                ))
            })?;

        tracing::Span::current().record("owner_id", owner_id);

        Ok(OwnerId(owner_id.to_string()))
    }
}
