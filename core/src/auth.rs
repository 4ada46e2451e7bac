use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a bearer session token. Sessions store only this
/// digest; the token itself never touches the database.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
