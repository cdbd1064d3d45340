use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A category of health data a grant can authorize reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareScope {
    Documents,
    LabResults,
    Vitals,
    Medications,
    Trends,
    ProfileSummary,
}

impl ShareScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareScope::Documents => "documents",
            ShareScope::LabResults => "lab_results",
            ShareScope::Vitals => "vitals",
            ShareScope::Medications => "medications",
            ShareScope::Trends => "trends",
            ShareScope::ProfileSummary => "profile_summary",
        }
    }

    /// Scopes whose records are addressable by id and may therefore be
    /// narrowed by a resource filter.
    pub fn supports_resource_filter(&self) -> bool {
        matches!(self, ShareScope::Documents | ShareScope::LabResults)
    }
}

/// Stored metadata and rules for one share link.
///
/// Only the SHA-256 of the bearer token is kept at rest; the raw token is
/// returned exactly once at issuance. `is_active` transitions true -> false
/// and never back, and `view_count` only grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareGrant {
    #[serde(rename = "_id")]
    pub id: String,
    pub token_hash: String,
    pub owner_profile_id: String,
    pub created_by: String,
    pub allowed_scopes: Vec<ShareScope>,
    pub resource_filter: Option<Vec<String>>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub purpose: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    pub max_views: Option<i64>,
    pub view_count: i64,
    pub is_active: bool,
    pub last_accessed_at: Option<mongodb::bson::DateTime>,
}

impl ShareGrant {
    pub fn new(
        token_hash: String,
        owner_profile_id: String,
        created_by: String,
        allowed_scopes: Vec<ShareScope>,
        expires_at: DateTime<Utc>,
        max_views: Option<i64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            token_hash,
            owner_profile_id,
            created_by,
            allowed_scopes,
            resource_filter: None,
            recipient_name: None,
            recipient_email: None,
            purpose: None,
            created_at: Utc::now(),
            expires_at,
            max_views,
            view_count: 0,
            is_active: true,
            last_accessed_at: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn views_exhausted(&self) -> bool {
        self.max_views.is_some_and(|max| self.view_count >= max)
    }
}
