//! Webhook secret tokens.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Random bytes per generated secret by default.
pub const DEFAULT_SECRET_BYTES: usize = 32;

/// Generates a secret from `len` random bytes, URL-safe base64 without
/// padding.
///
/// The result only uses `A-Z a-z 0-9 _ -`, which is what `setWebhook`
/// accepts. Keep `len` at 192 or below to stay within its 256-character cap.
pub fn generate_secret(len: usize) -> Result<String, getrandom::Error> {
    generate_secret_with(len, |bytes| URL_SAFE_NO_PAD.encode(bytes))
}

/// Generates a secret from `len` random bytes with a custom encoding.
pub fn generate_secret_with<F>(len: usize, encode: F) -> Result<String, getrandom::Error>
where
    F: FnOnce(&[u8]) -> String,
{
    let mut bytes = vec![0u8; len];
    getrandom::getrandom(&mut bytes)?;
    Ok(encode(&bytes))
}
