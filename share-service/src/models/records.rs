//! Record types owned by the upstream health-record services.
//!
//! This service only reads them, through the narrow repository traits in
//! `services::records`; the fields here are the minimum projection needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner_user_id: String,
    pub display_name: String,
    pub date_of_birth: Option<String>,
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub profile_id: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalReading {
    #[serde(rename = "_id")]
    pub id: String,
    pub profile_id: String,
    pub kind: String,
    pub value: f64,
    pub unit: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    #[serde(rename = "_id")]
    pub id: String,
    pub profile_id: String,
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    #[serde(rename = "_id")]
    pub id: String,
    pub profile_id: String,
    pub test_name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub observed_at: DateTime<Utc>,
}
