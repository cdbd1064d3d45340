pub mod access;
pub mod database;
pub mod error;
pub mod issuer;
pub mod metrics;
pub mod notification;
pub mod projector;
pub mod recorder;
pub mod records;
pub mod revocation;
pub mod store;
pub mod token;
pub mod validator;

pub use self::access::{AccessOrchestrator, SharedView};
pub use self::database::MongoDb;
pub use self::error::{DENIED_MESSAGE, DenialReason, ShareError};
pub use self::issuer::{IssuePolicy, IssuedShare, LinkIssuer};
pub use self::metrics::{get_metrics, init_metrics};
pub use self::notification::{NoopNotifier, Notifier, SmtpNotifier};
pub use self::projector::{ProjectionCaps, ScopedDataProjector};
pub use self::recorder::AccessRecorder;
pub use self::records::{
    DocumentStore, LabStore, MedicationStore, MongoDocumentStore, MongoLabStore,
    MongoMedicationStore, MongoProfileStore, MongoVitalStore, ProfileStore, VitalStore,
};
pub use self::revocation::RevocationHandler;
pub use self::store::{GrantStore, MongoGrantStore};
pub use self::validator::{LinkValidator, check_grant};
