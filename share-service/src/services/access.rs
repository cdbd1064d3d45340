use crate::dtos::ScopeSection;
use crate::middleware::ClientMeta;
use crate::models::{AccessAction, ShareScope};
use crate::services::error::ShareError;
use crate::services::projector::ScopedDataProjector;
use crate::services::recorder::AccessRecorder;
use crate::services::records::ProfileStore;
use crate::services::validator::LinkValidator;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// What a successful access returns to the anonymous caller.
pub struct SharedView {
    pub allowed_scopes: Vec<ShareScope>,
    pub data: Vec<ScopeSection>,
    pub expires_at: DateTime<Utc>,
    pub shared_by: String,
}

/// Request-level entry point for token redemption.
///
/// Always Validate -> Project -> Record, in that order: a failed or partial
/// projection never consumes a view, and a projection whose caller loses
/// the counter race is discarded rather than returned.
pub struct AccessOrchestrator {
    validator: LinkValidator,
    projector: ScopedDataProjector,
    recorder: AccessRecorder,
    profiles: Arc<dyn ProfileStore>,
}

impl AccessOrchestrator {
    pub fn new(
        validator: LinkValidator,
        projector: ScopedDataProjector,
        recorder: AccessRecorder,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            validator,
            projector,
            recorder,
            profiles,
        }
    }

    pub async fn access(
        &self,
        raw_token: &str,
        meta: &ClientMeta,
    ) -> Result<SharedView, ShareError> {
        let outcome = self.try_access(raw_token, meta).await;

        match &outcome {
            Ok(_) => {
                metrics::counter!("share_access_granted_total").increment(1);
            }
            Err(ShareError::Denied(reason)) => {
                metrics::counter!("share_access_denied_total", "reason" => reason.as_str())
                    .increment(1);
                tracing::info!(reason = %reason, "share access denied");
            }
            Err(e) => {
                tracing::error!(error = %e, "share access failed");
            }
        }

        outcome
    }

    async fn try_access(
        &self,
        raw_token: &str,
        meta: &ClientMeta,
    ) -> Result<SharedView, ShareError> {
        let grant = self.validator.validate(raw_token).await?;

        let data = self.projector.project(&grant).await?;

        // Counting happens last; if this caller lost the final view to a
        // concurrent reader, the projected data is dropped here.
        self.recorder
            .record(&grant, meta, AccessAction::Viewed)
            .await?;

        tracing::info!(
            grant_id = %grant.id,
            profile_id = %grant.owner_profile_id,
            ip = %meta.ip_address,
            "share accessed"
        );

        let shared_by = self
            .profiles
            .get(&grant.owner_profile_id)
            .await?
            .map(|p| p.display_name)
            .unwrap_or_default();

        Ok(SharedView {
            allowed_scopes: grant.allowed_scopes.clone(),
            data,
            expires_at: grant.expires_at,
            shared_by,
        })
    }
}
