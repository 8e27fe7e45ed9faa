//! Digest helpers. Raw secrets never touch storage; both lookup and
//! record-to-account binding go through these.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Lookup digest for a stored code: hex SHA-256 over `user_id ∥ secret`.
pub fn code_hash(user_id: u64, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.to_string().as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest binding a record to an account independent of the secret:
/// hex SHA-256 over `salt ∥ user_id`. The salt is a server-side secret, so
/// the digest cannot be precomputed from a user id alone.
pub fn user_hash(salt: &str, user_id: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(user_id.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time equality for hex digests.
pub fn digests_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
