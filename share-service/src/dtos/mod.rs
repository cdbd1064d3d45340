pub mod access;
pub mod shares;

pub use access::{
    DocumentEntry, LabEntry, MedicationEntry, ProfileSummary, ScopeSection, SharedDataResponse,
    VitalEntry, VitalTrend,
};
pub use shares::{
    AccessEventResponse, CreateShareRequest, CreateShareResponse, GrantStatus, GrantSummary,
    ListSharesParams,
};
