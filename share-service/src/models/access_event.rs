use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessAction {
    Viewed,
    Downloaded,
}

/// Append-only audit record for one successful share access.
///
/// Events are never updated or deleted; they live in their own collection
/// keyed by `grant_id` and outlive the grant itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareAccessEvent {
    #[serde(rename = "_id")]
    pub id: String,
    pub grant_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub accessed_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub action: AccessAction,
}

impl ShareAccessEvent {
    pub fn new(
        grant_id: String,
        ip_address: String,
        user_agent: String,
        action: AccessAction,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            grant_id,
            accessed_at: Utc::now(),
            ip_address,
            user_agent,
            action,
        }
    }
}
