pub mod access;
pub mod health;
pub mod shares;

pub use access::access_share;
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use shares::{create_share, list_share_events, list_shares, revoke_share};
