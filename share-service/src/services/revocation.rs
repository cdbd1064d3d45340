use crate::services::error::ShareError;
use crate::services::store::GrantStore;
use std::sync::Arc;

/// Owner-initiated permanent deactivation.
///
/// Idempotent: revoking an already-revoked grant succeeds and changes
/// nothing. There is no reactivate operation anywhere in this service.
pub struct RevocationHandler {
    grants: Arc<dyn GrantStore>,
}

impl RevocationHandler {
    pub fn new(grants: Arc<dyn GrantStore>) -> Self {
        Self { grants }
    }

    pub async fn deactivate(&self, owner_id: &str, grant_id: &str) -> Result<(), ShareError> {
        let grant = self
            .grants
            .find_by_id(grant_id)
            .await?
            .ok_or_else(|| ShareError::NotFound(format!("share {}", grant_id)))?;

        if grant.created_by != owner_id {
            return Err(ShareError::Authorization(
                "you did not create this share".to_string(),
            ));
        }

        self.grants.deactivate(grant_id).await?;

        metrics::counter!("share_revoked_total").increment(1);
        tracing::info!(grant_id = %grant_id, "share link revoked");

        Ok(())
    }
}
