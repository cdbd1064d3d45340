use crate::middleware::ClientMeta;
use crate::models::{AccessAction, ShareAccessEvent, ShareGrant};
use crate::services::error::{DenialReason, ShareError};
use crate::services::store::GrantStore;
use backoff::ExponentialBackoff;
use backoff::future::retry;
use std::sync::Arc;
use std::time::Duration;

/// Counts a consumed view after a successful projection.
///
/// The counter write is the grant store's atomic conditional increment;
/// losing the update race means this caller's view was never granted and
/// its projection result must be discarded. Transient storage failures are
/// retried within a short backoff window before giving up.
pub struct AccessRecorder {
    grants: Arc<dyn GrantStore>,
}

impl AccessRecorder {
    pub fn new(grants: Arc<dyn GrantStore>) -> Self {
        Self { grants }
    }

    pub async fn record(
        &self,
        grant: &ShareGrant,
        meta: &ClientMeta,
        action: AccessAction,
    ) -> Result<(), ShareError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(2)),
            ..Default::default()
        };

        let counted = retry(backoff, || async {
            self.grants
                .conditional_increment(&grant.id, grant.max_views)
                .await
                .map_err(|e| match e {
                    ShareError::Storage(_) => backoff::Error::transient(e),
                    other => backoff::Error::permanent(other),
                })
        })
        .await?;

        if !counted {
            tracing::info!(grant_id = %grant.id, "view counter race lost, access not granted");
            return Err(ShareError::Denied(DenialReason::ViewLimitReached));
        }

        // The view is already counted and the data already fetched; an
        // audit write failure must not take the response down with it.
        let event = ShareAccessEvent::new(
            grant.id.clone(),
            meta.ip_address.clone(),
            meta.user_agent.clone(),
            action,
        );

        if let Err(e) = self.grants.append_event(&event).await {
            tracing::warn!(
                grant_id = %grant.id,
                error = %e,
                "audit append failed, retrying in background"
            );
            let grants = self.grants.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(250)).await;
                if let Err(e) = grants.append_event(&event).await {
                    tracing::error!(
                        grant_id = %event.grant_id,
                        error = %e,
                        "audit append retry failed, event dropped"
                    );
                }
            });
        }

        Ok(())
    }
}
