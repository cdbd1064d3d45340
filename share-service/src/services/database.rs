use crate::models::{
    HealthDocument, LabResult, Medication, Profile, ShareAccessEvent, ShareGrant, VitalReading,
};
use mongodb::{
    Client as MongoClient, Collection, Database, IndexModel, bson::doc, options::IndexOptions,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for share-service");

        let grants = self.grants();

        // Unique index on token_hash: token lookup is a point read and
        // global token uniqueness is enforced by the store itself.
        let token_index = IndexModel::builder()
            .keys(doc! { "token_hash": 1 })
            .options(
                IndexOptions::builder()
                    .name("token_hash_lookup".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        grants.create_index(token_index, None).await.map_err(|e| {
            tracing::error!("Failed to create token_hash index on grants collection: {}", e);
            AppError::from(e)
        })?;
        tracing::info!("Created unique index on grants.token_hash");

        let owner_index = IndexModel::builder()
            .keys(doc! { "created_by": 1, "owner_profile_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("owner_lookup".to_string())
                    .build(),
            )
            .build();

        grants.create_index(owner_index, None).await.map_err(|e| {
            tracing::error!("Failed to create owner index on grants collection: {}", e);
            AppError::from(e)
        })?;
        tracing::info!("Created index on grants.(created_by, owner_profile_id)");

        let events_index = IndexModel::builder()
            .keys(doc! { "grant_id": 1, "accessed_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("grant_events_lookup".to_string())
                    .build(),
            )
            .build();

        self.access_events()
            .create_index(events_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create grant_id index on access_events collection: {}",
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created index on access_events.(grant_id, accessed_at)");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn grants(&self) -> Collection<ShareGrant> {
        self.db.collection("share_grants")
    }

    pub fn access_events(&self) -> Collection<ShareAccessEvent> {
        self.db.collection("share_access_events")
    }

    pub fn profiles(&self) -> Collection<Profile> {
        self.db.collection("profiles")
    }

    pub fn documents(&self) -> Collection<HealthDocument> {
        self.db.collection("documents")
    }

    pub fn vitals(&self) -> Collection<VitalReading> {
        self.db.collection("vitals")
    }

    pub fn medications(&self) -> Collection<Medication> {
        self.db.collection("medications")
    }

    pub fn lab_results(&self) -> Collection<LabResult> {
        self.db.collection("lab_results")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
