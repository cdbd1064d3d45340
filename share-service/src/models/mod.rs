pub mod access_event;
pub mod grant;
pub mod records;

pub use access_event::{AccessAction, ShareAccessEvent};
pub use grant::{ShareGrant, ShareScope};
pub use records::{HealthDocument, LabResult, Medication, Profile, VitalReading};
