//! Read-only repositories over the health-record collections.
//!
//! Each component receives exactly the stores it needs; there is no shared
//! privileged client with blanket read access.

use crate::models::{HealthDocument, LabResult, Medication, Profile, VitalReading};
use crate::services::MongoDb;
use crate::services::error::ShareError;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, profile_id: &str) -> Result<Option<Profile>, ShareError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<HealthDocument>, ShareError>;
    async fn by_profile(
        &self,
        profile_id: &str,
        limit: i64,
    ) -> Result<Vec<HealthDocument>, ShareError>;
}

#[async_trait]
pub trait VitalStore: Send + Sync {
    async fn recent(&self, profile_id: &str, limit: i64) -> Result<Vec<VitalReading>, ShareError>;
}

#[async_trait]
pub trait MedicationStore: Send + Sync {
    async fn active(&self, profile_id: &str) -> Result<Vec<Medication>, ShareError>;
}

#[async_trait]
pub trait LabStore: Send + Sync {
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<LabResult>, ShareError>;
    async fn by_profile(&self, profile_id: &str, limit: i64)
    -> Result<Vec<LabResult>, ShareError>;
}

#[derive(Clone)]
pub struct MongoProfileStore {
    db: MongoDb,
}

impl MongoProfileStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for MongoProfileStore {
    async fn get(&self, profile_id: &str) -> Result<Option<Profile>, ShareError> {
        let profile = self
            .db
            .profiles()
            .find_one(doc! { "_id": profile_id }, None)
            .await?;
        Ok(profile)
    }
}

#[derive(Clone)]
pub struct MongoDocumentStore {
    db: MongoDb,
}

impl MongoDocumentStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<HealthDocument>, ShareError> {
        let mut cursor = self
            .db
            .documents()
            .find(doc! { "_id": { "$in": ids } }, None)
            .await?;
        let mut documents = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            documents.push(document);
        }
        Ok(documents)
    }

    async fn by_profile(
        &self,
        profile_id: &str,
        limit: i64,
    ) -> Result<Vec<HealthDocument>, ShareError> {
        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .build();

        let mut cursor = self
            .db
            .documents()
            .find(doc! { "profile_id": profile_id }, find_options)
            .await?;
        let mut documents = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            documents.push(document);
        }
        Ok(documents)
    }
}

#[derive(Clone)]
pub struct MongoVitalStore {
    db: MongoDb,
}

impl MongoVitalStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VitalStore for MongoVitalStore {
    async fn recent(&self, profile_id: &str, limit: i64) -> Result<Vec<VitalReading>, ShareError> {
        let find_options = FindOptions::builder()
            .sort(doc! { "recorded_at": -1 })
            .limit(limit)
            .build();

        let mut cursor = self
            .db
            .vitals()
            .find(doc! { "profile_id": profile_id }, find_options)
            .await?;
        let mut vitals = Vec::new();
        while let Some(vital) = cursor.try_next().await? {
            vitals.push(vital);
        }
        Ok(vitals)
    }
}

#[derive(Clone)]
pub struct MongoMedicationStore {
    db: MongoDb,
}

impl MongoMedicationStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MedicationStore for MongoMedicationStore {
    async fn active(&self, profile_id: &str) -> Result<Vec<Medication>, ShareError> {
        let mut cursor = self
            .db
            .medications()
            .find(doc! { "profile_id": profile_id, "is_active": true }, None)
            .await?;
        let mut medications = Vec::new();
        while let Some(medication) = cursor.try_next().await? {
            medications.push(medication);
        }
        Ok(medications)
    }
}

#[derive(Clone)]
pub struct MongoLabStore {
    db: MongoDb,
}

impl MongoLabStore {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LabStore for MongoLabStore {
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<LabResult>, ShareError> {
        let mut cursor = self
            .db
            .lab_results()
            .find(doc! { "_id": { "$in": ids } }, None)
            .await?;
        let mut labs = Vec::new();
        while let Some(lab) = cursor.try_next().await? {
            labs.push(lab);
        }
        Ok(labs)
    }

    async fn by_profile(
        &self,
        profile_id: &str,
        limit: i64,
    ) -> Result<Vec<LabResult>, ShareError> {
        let find_options = FindOptions::builder()
            .sort(doc! { "observed_at": -1 })
            .limit(limit)
            .build();

        let mut cursor = self
            .db
            .lab_results()
            .find(doc! { "profile_id": profile_id }, find_options)
            .await?;
        let mut labs = Vec::new();
        while let Some(lab) = cursor.try_next().await? {
            labs.push(lab);
        }
        Ok(labs)
    }
}
