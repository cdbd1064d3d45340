use crate::dtos::CreateShareRequest;
use crate::models::{ShareGrant, ShareScope};
use crate::services::error::ShareError;
use crate::services::notification::{Notifier, share_invite_email};
use crate::services::records::{DocumentStore, LabStore, ProfileStore};
use crate::services::store::GrantStore;
use crate::services::token;
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Issuance policy knobs, sourced from configuration.
#[derive(Debug, Clone)]
pub struct IssuePolicy {
    pub base_url: String,
    pub max_ttl_hours: i64,
}

/// Result of a successful issuance. The raw token exists only here and in
/// the response sent back to the owner; the store keeps its hash.
pub struct IssuedShare {
    pub grant: ShareGrant,
    pub token: String,
    pub share_url: String,
}

/// Creates share grants on behalf of an authenticated owner.
///
/// All issuance-time checks happen here, before anything is persisted:
/// scope validity, TTL policy bounds, profile ownership, and resource
/// filter membership (each id must name a record of the shared profile,
/// verified against the record stores now rather than at access time).
pub struct LinkIssuer {
    grants: Arc<dyn GrantStore>,
    profiles: Arc<dyn ProfileStore>,
    documents: Arc<dyn DocumentStore>,
    labs: Arc<dyn LabStore>,
    notifier: Arc<dyn Notifier>,
    policy: IssuePolicy,
}

impl LinkIssuer {
    pub fn new(
        grants: Arc<dyn GrantStore>,
        profiles: Arc<dyn ProfileStore>,
        documents: Arc<dyn DocumentStore>,
        labs: Arc<dyn LabStore>,
        notifier: Arc<dyn Notifier>,
        policy: IssuePolicy,
    ) -> Self {
        Self {
            grants,
            profiles,
            documents,
            labs,
            notifier,
            policy,
        }
    }

    pub async fn create(
        &self,
        owner_id: &str,
        req: CreateShareRequest,
    ) -> Result<IssuedShare, ShareError> {
        let scopes = dedup_scopes(&req.allowed_scopes);
        if scopes.is_empty() {
            return Err(ShareError::Validation(
                "at least one scope is required".to_string(),
            ));
        }

        if req.expires_in_hours < 1 || req.expires_in_hours > self.policy.max_ttl_hours {
            return Err(ShareError::Validation(format!(
                "ttl must be between 1 and {} hours",
                self.policy.max_ttl_hours
            )));
        }

        if let Some(max_views) = req.max_views {
            if max_views < 1 {
                return Err(ShareError::Validation(
                    "max_views must be at least 1".to_string(),
                ));
            }
        }

        let profile = self
            .profiles
            .get(&req.profile_id)
            .await?
            .ok_or_else(|| ShareError::NotFound(format!("profile {}", req.profile_id)))?;

        if profile.owner_user_id != owner_id {
            return Err(ShareError::Authorization(
                "you do not own this profile".to_string(),
            ));
        }

        let resource_filter = match &req.resource_ids {
            Some(ids) if !ids.is_empty() => {
                self.verify_resource_filter(&req.profile_id, &scopes, ids)
                    .await?;
                Some(ids.clone())
            }
            _ => None,
        };

        let raw_token = token::generate_token();
        let mut grant = ShareGrant::new(
            token::hash_token(&raw_token),
            req.profile_id.clone(),
            owner_id.to_string(),
            scopes,
            Utc::now() + Duration::hours(req.expires_in_hours),
            req.max_views,
        );
        grant.resource_filter = resource_filter;
        grant.recipient_name = req.recipient_name.clone();
        grant.recipient_email = req.recipient_email.clone();
        grant.purpose = req.purpose.clone();

        self.grants.insert(&grant).await?;

        metrics::counter!("share_issued_total").increment(1);
        tracing::info!(
            grant_id = %grant.id,
            profile_id = %grant.owner_profile_id,
            scopes = ?grant.allowed_scopes,
            max_views = ?grant.max_views,
            "share link issued"
        );

        let share_url = format!("{}/share/{}", self.policy.base_url, raw_token);

        if req.notify {
            if let Some(recipient) = grant.recipient_email.clone() {
                let (subject, body) = share_invite_email(
                    &profile.display_name,
                    &share_url,
                    &grant.expires_at,
                    grant.purpose.as_deref(),
                );
                let notifier = self.notifier.clone();
                let grant_id = grant.id.clone();
                tokio::spawn(async move {
                    if let Err(e) = notifier.send(&recipient, &subject, &body).await {
                        tracing::warn!(
                            grant_id = %grant_id,
                            error = %e,
                            "recipient notification failed"
                        );
                    }
                });
            }
        }

        Ok(IssuedShare {
            grant,
            token: raw_token,
            share_url,
        })
    }

    /// Every filter id must name a document or lab result belonging to the
    /// shared profile, and the filter only makes sense when at least one
    /// id-addressable scope was granted.
    async fn verify_resource_filter(
        &self,
        profile_id: &str,
        scopes: &[ShareScope],
        ids: &[String],
    ) -> Result<(), ShareError> {
        if !scopes.iter().any(|s| s.supports_resource_filter()) {
            return Err(ShareError::Validation(
                "resource_ids require a documents or lab_results scope".to_string(),
            ));
        }

        let mut owned: HashSet<String> = HashSet::new();
        for document in self.documents.get_by_ids(ids).await? {
            if document.profile_id == profile_id {
                owned.insert(document.id);
            }
        }
        for lab in self.labs.get_by_ids(ids).await? {
            if lab.profile_id == profile_id {
                owned.insert(lab.id);
            }
        }

        for id in ids {
            if !owned.contains(id) {
                return Err(ShareError::Validation(format!(
                    "resource {} does not belong to profile {}",
                    id, profile_id
                )));
            }
        }

        Ok(())
    }
}

/// Drop duplicate scopes while preserving the order they were requested in.
fn dedup_scopes(scopes: &[ShareScope]) -> Vec<ShareScope> {
    let mut seen = HashSet::new();
    scopes
        .iter()
        .copied()
        .filter(|scope| seen.insert(*scope))
        .collect()
}
