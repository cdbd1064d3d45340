use crate::models::{AccessAction, ShareAccessEvent, ShareGrant, ShareScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateShareRequest {
    pub profile_id: String,
    #[validate(length(min = 1, message = "at least one scope is required"))]
    pub allowed_scopes: Vec<ShareScope>,
    pub resource_ids: Option<Vec<String>>,
    #[validate(length(min = 1, max = 120))]
    pub recipient_name: Option<String>,
    #[validate(email)]
    pub recipient_email: Option<String>,
    #[validate(length(max = 500))]
    pub purpose: Option<String>,
    #[validate(range(min = 1, message = "ttl must be at least one hour"))]
    pub expires_in_hours: i64,
    #[validate(range(min = 1, message = "max_views must be at least 1"))]
    pub max_views: Option<i64>,
    #[serde(default)]
    pub notify: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateShareResponse {
    pub token: String,
    pub share_url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListSharesParams {
    pub profile_id: Option<String>,
}

/// Lifecycle state of a grant as shown to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    Active,
    Expired,
    Revoked,
    Exhausted,
}

/// Owner-facing view of a grant. The bearer token is not recoverable here;
/// only its hash is stored.
#[derive(Debug, Serialize, Deserialize)]
pub struct GrantSummary {
    pub id: String,
    pub owner_profile_id: String,
    pub allowed_scopes: Vec<ShareScope>,
    pub resource_filter: Option<Vec<String>>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub purpose: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub max_views: Option<i64>,
    pub view_count: i64,
    pub status: GrantStatus,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl GrantSummary {
    pub fn from_grant(grant: ShareGrant, now: DateTime<Utc>) -> Self {
        let status = if !grant.is_active {
            GrantStatus::Revoked
        } else if grant.is_expired_at(now) {
            GrantStatus::Expired
        } else if grant.views_exhausted() {
            GrantStatus::Exhausted
        } else {
            GrantStatus::Active
        };

        Self {
            id: grant.id,
            owner_profile_id: grant.owner_profile_id,
            allowed_scopes: grant.allowed_scopes,
            resource_filter: grant.resource_filter,
            recipient_name: grant.recipient_name,
            recipient_email: grant.recipient_email,
            purpose: grant.purpose,
            created_at: grant.created_at,
            expires_at: grant.expires_at,
            max_views: grant.max_views,
            view_count: grant.view_count,
            status,
            last_accessed_at: grant.last_accessed_at.map(|d| d.to_chrono()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessEventResponse {
    pub id: String,
    pub accessed_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub action: AccessAction,
}

impl From<ShareAccessEvent> for AccessEventResponse {
    fn from(event: ShareAccessEvent) -> Self {
        Self {
            id: event.id,
            accessed_at: event.accessed_at,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            action: event.action,
        }
    }
}
