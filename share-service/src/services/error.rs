use service_core::error::AppError;
use std::fmt;
use thiserror::Error;

/// The single body returned for every access-time denial. Distinguishing
/// reasons on the wire would let a caller probe which tokens exist.
pub const DENIED_MESSAGE: &str = "This link is no longer available";

/// Why a token was refused. The first failing check in the fixed order
/// lookup -> active -> expiry -> view limit determines the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    NotFound,
    Deactivated,
    Expired,
    ViewLimitReached,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NotFound => "not_found",
            DenialReason::Deactivated => "deactivated",
            DenialReason::Expired => "expired",
            DenialReason::ViewLimitReached => "view_limit_reached",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("access denied: {0}")]
    Denied(DenialReason),

    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<mongodb::error::Error> for ShareError {
    fn from(err: mongodb::error::Error) -> Self {
        ShareError::Storage(anyhow::Error::new(err))
    }
}

impl From<ShareError> for AppError {
    fn from(err: ShareError) -> Self {
        match err {
            ShareError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ShareError::Authorization(msg) => AppError::Forbidden(anyhow::anyhow!(msg)),
            ShareError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            // Every denial reason collapses into one uniform 404.
            ShareError::Denied(_) => AppError::NotFound(anyhow::anyhow!(DENIED_MESSAGE)),
            ShareError::Storage(e) => AppError::DatabaseError(e),
            ShareError::Internal(e) => AppError::InternalError(e),
        }
    }
}
