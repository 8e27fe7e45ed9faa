use rand::RngExt;

use crate::domain::types::SECRET_LEN;

/// Charset for generated secrets: alphanumeric only, so the token can sit in
/// a URL query parameter without escaping.
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// A token that does not parse as `{user_id}~{secret}`.
/// Distinct from "well-formed but wrong": malformed payloads are never
/// attributed to a real user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("malformed autologin token")]
pub struct MalformedToken;

/// Generate a fresh random secret. Pure; persistence is the caller's job.
pub fn generate_secret() -> String {
    let mut rng = rand::rng();
    (0..SECRET_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Pack the wire form `{user_id}~{secret}` embedded in login URLs.
pub fn encode_token(user_id: u64, secret: &str) -> String {
    format!("{user_id}~{secret}")
}

/// Unpack a wire token. Splits on the first `~` only; anything after it must
/// be a non-empty alphanumeric secret and anything before it a non-empty
/// base-10 user id.
pub fn decode_token(raw: &str) -> Result<(u64, String), MalformedToken> {
    let (user_part, secret_part) = raw.split_once('~').ok_or(MalformedToken)?;
    if user_part.is_empty() || !user_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedToken);
    }
    let user_id: u64 = user_part.parse().map_err(|_| MalformedToken)?;
    if secret_part.is_empty() || !secret_part.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(MalformedToken);
    }
    Ok((user_id, secret_part.to_owned()))
}
