use rand::RngCore;
use sha2::{Digest, Sha256};

/// 32 random bytes, hex-encoded: 256 bits of entropy per token.
const TOKEN_BYTES: usize = 32;

/// Mint a new bearer token. Returned to the owner exactly once; only its
/// hash is ever persisted.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// At-rest form of a token. Lookups hash the presented token and match on
/// the unique `token_hash` index.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
