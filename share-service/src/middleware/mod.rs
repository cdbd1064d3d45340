pub mod client_meta;
pub mod owner_id;

pub use client_meta::ClientMeta;
pub use owner_id::OwnerId;
