use crate::models::{ShareAccessEvent, ShareGrant};
use crate::services::MongoDb;
use crate::services::error::ShareError;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;

/// Durable storage for share grants and their audit trail.
///
/// The one operation with real concurrency semantics is
/// `conditional_increment`: the view-limit check and the counter write must
/// be a single atomic store operation, never a read followed by a write.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn insert(&self, grant: &ShareGrant) -> Result<(), ShareError>;

    async fn find_by_token_hash(&self, token_hash: &str)
    -> Result<Option<ShareGrant>, ShareError>;

    async fn find_by_id(&self, grant_id: &str) -> Result<Option<ShareGrant>, ShareError>;

    /// Grants created by `owner_id`, optionally narrowed to one profile,
    /// newest first.
    async fn find_by_owner(
        &self,
        owner_id: &str,
        profile_id: Option<&str>,
    ) -> Result<Vec<ShareGrant>, ShareError>;

    /// Count one view, but only if the grant is still active and, when
    /// `max_views` is set, strictly under its limit at the moment of the
    /// write. Returns whether this caller won the view.
    ///
    /// `max_views` is immutable after issuance, so the caller passes the
    /// literal it read; the store embeds it in the update predicate.
    async fn conditional_increment(
        &self,
        grant_id: &str,
        max_views: Option<i64>,
    ) -> Result<bool, ShareError>;

    /// Permanently deactivate. Safe to call repeatedly; there is no
    /// operation anywhere that sets `is_active` back to true.
    async fn deactivate(&self, grant_id: &str) -> Result<(), ShareError>;

    async fn append_event(&self, event: &ShareAccessEvent) -> Result<(), ShareError>;

    /// Audit events for one grant, newest first.
    async fn events_for_grant(&self, grant_id: &str)
    -> Result<Vec<ShareAccessEvent>, ShareError>;

    async fn health_check(&self) -> Result<(), ShareError>;
}

#[derive(Clone)]
pub struct MongoGrantStore {
    db: MongoDb,
}

impl MongoGrantStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GrantStore for MongoGrantStore {
    async fn insert(&self, grant: &ShareGrant) -> Result<(), ShareError> {
        self.db.grants().insert_one(grant, None).await?;
        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<ShareGrant>, ShareError> {
        let grant = self
            .db
            .grants()
            .find_one(doc! { "token_hash": token_hash }, None)
            .await?;
        Ok(grant)
    }

    async fn find_by_id(&self, grant_id: &str) -> Result<Option<ShareGrant>, ShareError> {
        let grant = self
            .db
            .grants()
            .find_one(doc! { "_id": grant_id }, None)
            .await?;
        Ok(grant)
    }

    async fn find_by_owner(
        &self,
        owner_id: &str,
        profile_id: Option<&str>,
    ) -> Result<Vec<ShareGrant>, ShareError> {
        let mut filter = doc! { "created_by": owner_id };
        if let Some(profile_id) = profile_id {
            filter.insert("owner_profile_id", profile_id);
        }

        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let mut cursor = self.db.grants().find(filter, find_options).await?;
        let mut grants = Vec::new();
        while let Some(grant) = cursor.try_next().await? {
            grants.push(grant);
        }
        Ok(grants)
    }

    async fn conditional_increment(
        &self,
        grant_id: &str,
        max_views: Option<i64>,
    ) -> Result<bool, ShareError> {
        // The limit predicate lives in the update filter, so the check and
        // the increment execute as one server-side operation. Two racing
        // readers at the last remaining view cannot both match.
        let mut filter = doc! { "_id": grant_id, "is_active": true };
        if let Some(max) = max_views {
            filter.insert("view_count", doc! { "$lt": max });
        }

        let update = doc! {
            "$inc": { "view_count": 1i64 },
            "$set": { "last_accessed_at": mongodb::bson::DateTime::now() },
        };

        let result = self.db.grants().update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }

    async fn deactivate(&self, grant_id: &str) -> Result<(), ShareError> {
        self.db
            .grants()
            .update_one(
                doc! { "_id": grant_id },
                doc! { "$set": { "is_active": false } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn append_event(&self, event: &ShareAccessEvent) -> Result<(), ShareError> {
        self.db.access_events().insert_one(event, None).await?;
        Ok(())
    }

    async fn events_for_grant(
        &self,
        grant_id: &str,
    ) -> Result<Vec<ShareAccessEvent>, ShareError> {
        let find_options = FindOptions::builder()
            .sort(doc! { "accessed_at": -1 })
            .build();

        let mut cursor = self
            .db
            .access_events()
            .find(doc! { "grant_id": grant_id }, find_options)
            .await?;
        let mut events = Vec::new();
        while let Some(event) = cursor.try_next().await? {
            events.push(event);
        }
        Ok(events)
    }

    async fn health_check(&self) -> Result<(), ShareError> {
        self.db
            .health_check()
            .await
            .map_err(|e| ShareError::Storage(anyhow::anyhow!(e.to_string())))
    }
}
