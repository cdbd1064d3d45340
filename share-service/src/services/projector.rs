use crate::dtos::{
    DocumentEntry, LabEntry, MedicationEntry, ProfileSummary, ScopeSection, VitalEntry, VitalTrend,
};
use crate::models::{ShareGrant, ShareScope, VitalReading};
use crate::services::error::ShareError;
use crate::services::records::{
    DocumentStore, LabStore, MedicationStore, ProfileStore, VitalStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-scope caps on how much data a single access may return.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionCaps {
    pub documents: i64,
    pub lab_results: i64,
    pub vitals: i64,
}

impl Default for ProjectionCaps {
    fn default() -> Self {
        Self {
            documents: 100,
            lab_results: 100,
            vitals: 50,
        }
    }
}

/// Assembles the data a validated grant authorizes, and nothing else.
///
/// The output carries exactly one section per authorized scope. When a
/// resource filter is present, candidates are filtered twice: by id
/// membership, and by re-checking the record's own `profile_id` against the
/// grant, so an id smuggled in from another profile returns nothing.
pub struct ScopedDataProjector {
    profiles: Arc<dyn ProfileStore>,
    documents: Arc<dyn DocumentStore>,
    vitals: Arc<dyn VitalStore>,
    medications: Arc<dyn MedicationStore>,
    labs: Arc<dyn LabStore>,
    caps: ProjectionCaps,
}

impl ScopedDataProjector {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        documents: Arc<dyn DocumentStore>,
        vitals: Arc<dyn VitalStore>,
        medications: Arc<dyn MedicationStore>,
        labs: Arc<dyn LabStore>,
        caps: ProjectionCaps,
    ) -> Self {
        Self {
            profiles,
            documents,
            vitals,
            medications,
            labs,
            caps,
        }
    }

    pub async fn project(&self, grant: &ShareGrant) -> Result<Vec<ScopeSection>, ShareError> {
        let mut sections = Vec::with_capacity(grant.allowed_scopes.len());

        for scope in &grant.allowed_scopes {
            let section = match scope {
                ShareScope::Documents => {
                    ScopeSection::Documents(self.project_documents(grant).await?)
                }
                ShareScope::LabResults => {
                    ScopeSection::LabResults(self.project_labs(grant).await?)
                }
                ShareScope::Vitals => ScopeSection::Vitals(self.project_vitals(grant).await?),
                ShareScope::Medications => {
                    ScopeSection::Medications(self.project_medications(grant).await?)
                }
                ShareScope::Trends => ScopeSection::Trends(self.project_trends(grant).await?),
                ShareScope::ProfileSummary => {
                    ScopeSection::ProfileSummary(self.project_profile(grant).await?)
                }
            };
            sections.push(section);
        }

        Ok(sections)
    }

    async fn project_documents(&self, grant: &ShareGrant) -> Result<Vec<DocumentEntry>, ShareError> {
        let documents = match &grant.resource_filter {
            Some(ids) => {
                let mut documents = self.documents.get_by_ids(ids).await?;
                documents
                    .retain(|d| ids.contains(&d.id) && d.profile_id == grant.owner_profile_id);
                documents
            }
            None => {
                self.documents
                    .by_profile(&grant.owner_profile_id, self.caps.documents)
                    .await?
            }
        };

        Ok(documents.into_iter().map(DocumentEntry::from).collect())
    }

    async fn project_labs(&self, grant: &ShareGrant) -> Result<Vec<LabEntry>, ShareError> {
        let labs = match &grant.resource_filter {
            Some(ids) => {
                let mut labs = self.labs.get_by_ids(ids).await?;
                labs.retain(|l| ids.contains(&l.id) && l.profile_id == grant.owner_profile_id);
                labs
            }
            None => {
                self.labs
                    .by_profile(&grant.owner_profile_id, self.caps.lab_results)
                    .await?
            }
        };

        Ok(labs.into_iter().map(LabEntry::from).collect())
    }

    async fn project_vitals(&self, grant: &ShareGrant) -> Result<Vec<VitalEntry>, ShareError> {
        let vitals = self
            .vitals
            .recent(&grant.owner_profile_id, self.caps.vitals)
            .await?;
        Ok(vitals.into_iter().map(VitalEntry::from).collect())
    }

    async fn project_medications(
        &self,
        grant: &ShareGrant,
    ) -> Result<Vec<MedicationEntry>, ShareError> {
        let medications = self.medications.active(&grant.owner_profile_id).await?;
        Ok(medications.into_iter().map(MedicationEntry::from).collect())
    }

    async fn project_trends(&self, grant: &ShareGrant) -> Result<Vec<VitalTrend>, ShareError> {
        let vitals = self
            .vitals
            .recent(&grant.owner_profile_id, self.caps.vitals)
            .await?;
        Ok(summarize_trends(&vitals))
    }

    async fn project_profile(&self, grant: &ShareGrant) -> Result<ProfileSummary, ShareError> {
        let profile = self
            .profiles
            .get(&grant.owner_profile_id)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("profile {} missing for grant {}", grant.owner_profile_id, grant.id)
            })?;
        Ok(ProfileSummary::from(profile))
    }
}

/// Fold a recent-vitals window into one summary per vital kind. The input
/// arrives newest first, so the first reading seen per kind is the latest.
fn summarize_trends(vitals: &[VitalReading]) -> Vec<VitalTrend> {
    let mut by_kind: BTreeMap<&str, VitalTrend> = BTreeMap::new();

    for vital in vitals {
        match by_kind.get_mut(vital.kind.as_str()) {
            Some(trend) => {
                trend.count += 1;
                trend.min = trend.min.min(vital.value);
                trend.max = trend.max.max(vital.value);
            }
            None => {
                by_kind.insert(
                    vital.kind.as_str(),
                    VitalTrend {
                        kind: vital.kind.clone(),
                        unit: vital.unit.clone(),
                        count: 1,
                        min: vital.value,
                        max: vital.value,
                        latest: vital.value,
                        latest_at: vital.recorded_at,
                    },
                );
            }
        }
    }

    by_kind.into_values().collect()
}
