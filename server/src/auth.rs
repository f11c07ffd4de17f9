//! HMAC request authentication for the ingest route.
//!
//! Producers sign the raw request body with HMAC-SHA-256 under the shared
//! secret and send the result as `X-Assurance-Signature: sha256=<hex>`.
//! Verification recomputes the tag and compares it in constant time
//! (`Mac::verify_slice`), so signature checking leaks nothing through
//! timing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "X-Assurance-Signature";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the signature header value for `body` under `secret`.
pub fn sign(body: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Check `header` against the HMAC of `body` under `secret`.
///
/// An empty header or an empty secret always fails — enabling signing with
/// no secret configured must reject, not silently allow.
pub fn verify_signature(body: &[u8], header: &str, secret: &str) -> bool {
    if header.is_empty() || secret.is_empty() {
        return false;
    }
    let Some(digest_hex) = header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(provided) = hex::decode(digest_hex) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}
