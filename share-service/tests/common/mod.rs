#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use service_core::config::Config as CoreConfig;
use share_service::config::{MongoConfig, ShareServiceConfig, SharePolicyConfig};
use share_service::dtos::CreateShareResponse;
use share_service::middleware::ClientMeta;
use share_service::models::{
    HealthDocument, LabResult, Medication, Profile, ShareAccessEvent, ShareGrant, VitalReading,
};
use share_service::services::{
    DocumentStore, GrantStore, LabStore, MedicationStore, NoopNotifier, ProfileStore, ShareError,
    VitalStore,
};
use share_service::startup::{AppState, Application};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const OWNER_ID: &str = "user-owner-1";
pub const OTHER_OWNER_ID: &str = "user-owner-2";
pub const PROFILE_ID: &str = "profile-1";
pub const OTHER_PROFILE_ID: &str = "profile-2";

/// In-memory GrantStore with the same conditional-increment semantics as
/// the MongoDB implementation: the limit check and the counter write happen
/// under one lock, so racing callers serialize exactly as they would
/// against the server-side guarded update.
#[derive(Default)]
pub struct InMemoryGrantStore {
    grants: Mutex<HashMap<String, ShareGrant>>,
    events: Mutex<Vec<ShareAccessEvent>>,
}

impl InMemoryGrantStore {
    pub fn stored_grant(&self, grant_id: &str) -> Option<ShareGrant> {
        self.grants.lock().unwrap().get(grant_id).cloned()
    }

    pub fn stored_events(&self) -> Vec<ShareAccessEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn insert(&self, grant: &ShareGrant) -> Result<(), ShareError> {
        self.grants
            .lock()
            .unwrap()
            .insert(grant.id.clone(), grant.clone());
        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<ShareGrant>, ShareError> {
        Ok(self
            .grants
            .lock()
            .unwrap()
            .values()
            .find(|g| g.token_hash == token_hash)
            .cloned())
    }

    async fn find_by_id(&self, grant_id: &str) -> Result<Option<ShareGrant>, ShareError> {
        Ok(self.grants.lock().unwrap().get(grant_id).cloned())
    }

    async fn find_by_owner(
        &self,
        owner_id: &str,
        profile_id: Option<&str>,
    ) -> Result<Vec<ShareGrant>, ShareError> {
        let mut grants: Vec<ShareGrant> = self
            .grants
            .lock()
            .unwrap()
            .values()
            .filter(|g| g.created_by == owner_id)
            .filter(|g| profile_id.map_or(true, |p| g.owner_profile_id == p))
            .cloned()
            .collect();
        grants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(grants)
    }

    async fn conditional_increment(
        &self,
        grant_id: &str,
        max_views: Option<i64>,
    ) -> Result<bool, ShareError> {
        let mut grants = self.grants.lock().unwrap();
        match grants.get_mut(grant_id) {
            Some(g) if g.is_active && max_views.map_or(true, |max| g.view_count < max) => {
                g.view_count += 1;
                g.last_accessed_at = Some(mongodb::bson::DateTime::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn deactivate(&self, grant_id: &str) -> Result<(), ShareError> {
        if let Some(g) = self.grants.lock().unwrap().get_mut(grant_id) {
            g.is_active = false;
        }
        Ok(())
    }

    async fn append_event(&self, event: &ShareAccessEvent) -> Result<(), ShareError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn events_for_grant(
        &self,
        grant_id: &str,
    ) -> Result<Vec<ShareAccessEvent>, ShareError> {
        let mut events: Vec<ShareAccessEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.grant_id == grant_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.accessed_at.cmp(&a.accessed_at));
        Ok(events)
    }

    async fn health_check(&self) -> Result<(), ShareError> {
        Ok(())
    }
}

/// Wrapper that fails the first conditional increment with a transient
/// storage error, then behaves normally. Exercises the recorder's retry.
pub struct FailingOnceGrantStore {
    pub inner: Arc<InMemoryGrantStore>,
    failed: AtomicBool,
}

impl FailingOnceGrantStore {
    pub fn new(inner: Arc<InMemoryGrantStore>) -> Self {
        Self {
            inner,
            failed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl GrantStore for FailingOnceGrantStore {
    async fn insert(&self, grant: &ShareGrant) -> Result<(), ShareError> {
        self.inner.insert(grant).await
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<ShareGrant>, ShareError> {
        self.inner.find_by_token_hash(token_hash).await
    }

    async fn find_by_id(&self, grant_id: &str) -> Result<Option<ShareGrant>, ShareError> {
        self.inner.find_by_id(grant_id).await
    }

    async fn find_by_owner(
        &self,
        owner_id: &str,
        profile_id: Option<&str>,
    ) -> Result<Vec<ShareGrant>, ShareError> {
        self.inner.find_by_owner(owner_id, profile_id).await
    }

    async fn conditional_increment(
        &self,
        grant_id: &str,
        max_views: Option<i64>,
    ) -> Result<bool, ShareError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(ShareError::Storage(anyhow::anyhow!(
                "simulated transient storage failure"
            )));
        }
        self.inner.conditional_increment(grant_id, max_views).await
    }

    async fn deactivate(&self, grant_id: &str) -> Result<(), ShareError> {
        self.inner.deactivate(grant_id).await
    }

    async fn append_event(&self, event: &ShareAccessEvent) -> Result<(), ShareError> {
        self.inner.append_event(event).await
    }

    async fn events_for_grant(
        &self,
        grant_id: &str,
    ) -> Result<Vec<ShareAccessEvent>, ShareError> {
        self.inner.events_for_grant(grant_id).await
    }

    async fn health_check(&self) -> Result<(), ShareError> {
        self.inner.health_check().await
    }
}

/// In-memory stand-ins for the upstream health-record repositories.
#[derive(Default)]
pub struct InMemoryRecords {
    pub profiles: Mutex<HashMap<String, Profile>>,
    pub documents: Mutex<Vec<HealthDocument>>,
    pub vitals: Mutex<Vec<VitalReading>>,
    pub medications: Mutex<Vec<Medication>>,
    pub labs: Mutex<Vec<LabResult>>,
}

#[async_trait]
impl ProfileStore for InMemoryRecords {
    async fn get(&self, profile_id: &str) -> Result<Option<Profile>, ShareError> {
        Ok(self.profiles.lock().unwrap().get(profile_id).cloned())
    }
}

#[async_trait]
impl DocumentStore for InMemoryRecords {
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<HealthDocument>, ShareError> {
        Ok(self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect())
    }

    async fn by_profile(
        &self,
        profile_id: &str,
        limit: i64,
    ) -> Result<Vec<HealthDocument>, ShareError> {
        let mut documents: Vec<HealthDocument> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.profile_id == profile_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        documents.truncate(limit as usize);
        Ok(documents)
    }
}

#[async_trait]
impl VitalStore for InMemoryRecords {
    async fn recent(&self, profile_id: &str, limit: i64) -> Result<Vec<VitalReading>, ShareError> {
        let mut vitals: Vec<VitalReading> = self
            .vitals
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.profile_id == profile_id)
            .cloned()
            .collect();
        vitals.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        vitals.truncate(limit as usize);
        Ok(vitals)
    }
}

#[async_trait]
impl MedicationStore for InMemoryRecords {
    async fn active(&self, profile_id: &str) -> Result<Vec<Medication>, ShareError> {
        Ok(self
            .medications
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.profile_id == profile_id && m.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LabStore for InMemoryRecords {
    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<LabResult>, ShareError> {
        Ok(self
            .labs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect())
    }

    async fn by_profile(
        &self,
        profile_id: &str,
        limit: i64,
    ) -> Result<Vec<LabResult>, ShareError> {
        let mut labs: Vec<LabResult> = self
            .labs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.profile_id == profile_id)
            .cloned()
            .collect();
        labs.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
        labs.truncate(limit as usize);
        Ok(labs)
    }
}

pub fn test_config() -> ShareServiceConfig {
    ShareServiceConfig {
        common: CoreConfig {
            port: 0,
            log_level: "info".to_string(),
        },
        mongodb: MongoConfig {
            uri: "mongodb://unused".to_string(),
            database: "unused".to_string(),
        },
        share: SharePolicyConfig {
            base_url: "http://localhost:8080".to_string(),
            max_ttl_hours: 24 * 90,
            max_documents: 100,
            max_lab_results: 100,
            max_vitals: 50,
            // High enough that tests never trip the limiter.
            access_rate_per_min: 600,
        },
        smtp: None,
    }
}

pub fn seed_profiles(records: &InMemoryRecords) {
    let mut profiles = records.profiles.lock().unwrap();
    profiles.insert(
        PROFILE_ID.to_string(),
        Profile {
            id: PROFILE_ID.to_string(),
            owner_user_id: OWNER_ID.to_string(),
            display_name: "Alice Example".to_string(),
            date_of_birth: Some("1985-02-17".to_string()),
            blood_type: Some("O+".to_string()),
            allergies: vec!["penicillin".to_string()],
            conditions: vec!["hypertension".to_string()],
        },
    );
    profiles.insert(
        OTHER_PROFILE_ID.to_string(),
        Profile {
            id: OTHER_PROFILE_ID.to_string(),
            owner_user_id: OTHER_OWNER_ID.to_string(),
            display_name: "Bob Example".to_string(),
            date_of_birth: None,
            blood_type: None,
            allergies: vec![],
            conditions: vec![],
        },
    );
}

pub fn seed_health_data(records: &InMemoryRecords) {
    let now = Utc::now();

    let mut documents = records.documents.lock().unwrap();
    for (id, profile_id, name) in [
        ("doc-a", PROFILE_ID, "mri-report.pdf"),
        ("doc-b", PROFILE_ID, "discharge-summary.pdf"),
        ("doc-c", PROFILE_ID, "xray.png"),
        ("doc-other", OTHER_PROFILE_ID, "bob-report.pdf"),
    ] {
        documents.push(HealthDocument {
            id: id.to_string(),
            profile_id: profile_id.to_string(),
            original_name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            size: 1024,
            created_at: now - Duration::days(1),
        });
    }

    let mut vitals = records.vitals.lock().unwrap();
    for (kind, value, minutes_ago) in [
        ("heart_rate", 72.0, 10),
        ("heart_rate", 88.0, 120),
        ("blood_pressure_systolic", 128.0, 30),
    ] {
        vitals.push(VitalReading {
            id: uuid::Uuid::new_v4().to_string(),
            profile_id: PROFILE_ID.to_string(),
            kind: kind.to_string(),
            value,
            unit: "bpm".to_string(),
            recorded_at: now - Duration::minutes(minutes_ago),
        });
    }
    vitals.push(VitalReading {
        id: uuid::Uuid::new_v4().to_string(),
        profile_id: OTHER_PROFILE_ID.to_string(),
        kind: "heart_rate".to_string(),
        value: 60.0,
        unit: "bpm".to_string(),
        recorded_at: now,
    });

    let mut medications = records.medications.lock().unwrap();
    medications.push(Medication {
        id: "med-a".to_string(),
        profile_id: PROFILE_ID.to_string(),
        name: "Lisinopril".to_string(),
        dosage: Some("10mg".to_string()),
        frequency: Some("daily".to_string()),
        is_active: true,
    });
    medications.push(Medication {
        id: "med-b".to_string(),
        profile_id: PROFILE_ID.to_string(),
        name: "Amoxicillin".to_string(),
        dosage: Some("500mg".to_string()),
        frequency: Some("3x daily".to_string()),
        is_active: false,
    });

    let mut labs = records.labs.lock().unwrap();
    labs.push(LabResult {
        id: "lab-a".to_string(),
        profile_id: PROFILE_ID.to_string(),
        test_name: "HbA1c".to_string(),
        value: "5.6".to_string(),
        unit: Some("%".to_string()),
        reference_range: Some("4.0-5.6".to_string()),
        observed_at: now - Duration::days(7),
    });
    labs.push(LabResult {
        id: "lab-other".to_string(),
        profile_id: OTHER_PROFILE_ID.to_string(),
        test_name: "HbA1c".to_string(),
        value: "6.1".to_string(),
        unit: Some("%".to_string()),
        reference_range: Some("4.0-5.6".to_string()),
        observed_at: now - Duration::days(3),
    });
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub state: AppState,
    pub grants: Arc<InMemoryGrantStore>,
    pub records: Arc<InMemoryRecords>,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the service on a random port over in-memory stores, seeded
    /// with two profiles' worth of health data.
    pub async fn spawn() -> Self {
        let records = Arc::new(InMemoryRecords::default());
        seed_profiles(&records);
        seed_health_data(&records);

        let grants = Arc::new(InMemoryGrantStore::default());

        let state = AppState::assemble(
            test_config(),
            grants.clone(),
            records.clone(),
            records.clone(),
            records.clone(),
            records.clone(),
            records.clone(),
            Arc::new(NoopNotifier),
        );

        let app = Application::serve(state.clone())
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            state,
            grants,
            records,
            client: reqwest::Client::new(),
        }
    }

    /// Issue a share over HTTP as `owner`, panicking on non-201.
    pub async fn issue_share(
        &self,
        owner: &str,
        body: serde_json::Value,
    ) -> CreateShareResponse {
        let response = self
            .client
            .post(format!("{}/shares", self.address))
            .header("X-User-ID", owner)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(
            reqwest::StatusCode::CREATED,
            response.status(),
            "share issuance failed"
        );
        response.json().await.expect("Failed to parse JSON")
    }

    pub async fn access(&self, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/share/{}", self.address, token))
            .header("User-Agent", "integration-test")
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub fn client_meta() -> ClientMeta {
    ClientMeta {
        ip_address: "203.0.113.7".to_string(),
        user_agent: "integration-test".to_string(),
    }
}
