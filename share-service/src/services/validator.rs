use crate::models::ShareGrant;
use crate::services::error::{DenialReason, ShareError};
use crate::services::store::GrantStore;
use crate::services::token;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Evaluate a grant's denial conditions in their fixed order:
/// deactivation, then expiry, then view limit. The first failure wins, so
/// a revoked grant reports `Deactivated` even when it is also expired.
///
/// Pure and side-effect free; the caller supplies `now`.
pub fn check_grant(grant: &ShareGrant, now: DateTime<Utc>) -> Result<(), DenialReason> {
    if !grant.is_active {
        return Err(DenialReason::Deactivated);
    }
    if grant.is_expired_at(now) {
        return Err(DenialReason::Expired);
    }
    if grant.views_exhausted() {
        return Err(DenialReason::ViewLimitReached);
    }
    Ok(())
}

/// Token-to-grant resolution. Reads only; never advances `view_count` or
/// touches any stored field. Expiration is checked lazily here on every
/// access, so no background sweep is needed for correctness.
pub struct LinkValidator {
    grants: Arc<dyn GrantStore>,
}

impl LinkValidator {
    pub fn new(grants: Arc<dyn GrantStore>) -> Self {
        Self { grants }
    }

    pub async fn validate(&self, raw_token: &str) -> Result<ShareGrant, ShareError> {
        let token_hash = token::hash_token(raw_token);
        let grant = self
            .grants
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or(ShareError::Denied(DenialReason::NotFound))?;

        check_grant(&grant, Utc::now()).map_err(ShareError::Denied)?;
        Ok(grant)
    }
}
