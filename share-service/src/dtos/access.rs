use crate::models::{HealthDocument, LabResult, Medication, Profile, ShareScope, VitalReading};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One projected section of shared data.
///
/// The payload is a list of these, one per authorized scope; a scope the
/// grant does not carry has no variant in the list at all, so unauthorized
/// categories cannot leak structurally.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "scope", content = "records", rename_all = "snake_case")]
pub enum ScopeSection {
    Documents(Vec<DocumentEntry>),
    LabResults(Vec<LabEntry>),
    Vitals(Vec<VitalEntry>),
    Medications(Vec<MedicationEntry>),
    Trends(Vec<VitalTrend>),
    ProfileSummary(ProfileSummary),
}

impl ScopeSection {
    pub fn scope(&self) -> ShareScope {
        match self {
            ScopeSection::Documents(_) => ShareScope::Documents,
            ScopeSection::LabResults(_) => ShareScope::LabResults,
            ScopeSection::Vitals(_) => ShareScope::Vitals,
            ScopeSection::Medications(_) => ShareScope::Medications,
            ScopeSection::Trends(_) => ShareScope::Trends,
            ScopeSection::ProfileSummary(_) => ShareScope::ProfileSummary,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<HealthDocument> for DocumentEntry {
    fn from(doc: HealthDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.original_name,
            mime_type: doc.mime_type,
            size: doc.size,
            uploaded_at: doc.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LabEntry {
    pub id: String,
    pub test_name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl From<LabResult> for LabEntry {
    fn from(lab: LabResult) -> Self {
        Self {
            id: lab.id,
            test_name: lab.test_name,
            value: lab.value,
            unit: lab.unit,
            reference_range: lab.reference_range,
            observed_at: lab.observed_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VitalEntry {
    pub kind: String,
    pub value: f64,
    pub unit: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<VitalReading> for VitalEntry {
    fn from(vital: VitalReading) -> Self {
        Self {
            kind: vital.kind,
            value: vital.value,
            unit: vital.unit,
            recorded_at: vital.recorded_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
}

impl From<Medication> for MedicationEntry {
    fn from(med: Medication) -> Self {
        Self {
            name: med.name,
            dosage: med.dosage,
            frequency: med.frequency,
        }
    }
}

/// Per-kind summary computed from the recent vitals window.
#[derive(Debug, Serialize, Deserialize)]
pub struct VitalTrend {
    pub kind: String,
    pub unit: String,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub latest: f64,
    pub latest_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub display_name: String,
    pub date_of_birth: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Vec<String>,
    pub conditions: Vec<String>,
}

impl From<Profile> for ProfileSummary {
    fn from(profile: Profile) -> Self {
        Self {
            display_name: profile.display_name,
            date_of_birth: profile.date_of_birth,
            blood_type: profile.blood_type,
            allergies: profile.allergies,
            conditions: profile.conditions,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SharedDataResponse {
    pub success: bool,
    pub allowed_scopes: Vec<ShareScope>,
    pub data: Vec<ScopeSection>,
    pub expires_at: DateTime<Utc>,
    pub shared_by: String,
}
