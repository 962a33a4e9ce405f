//! HMAC-SHA256 payload signatures for outbound webhooks.
//!
//! The digest covers the raw request body only, keyed by the endpoint's
//! secret, and travels as `X-Webhook-Signature: sha256=<lowercase hex>`.
//! Receivers recompute it over the body they received and compare.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix carried in front of the hex digest in the signature header.
pub const SIGNATURE_PREFIX: &str = "sha256=";

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

/// Compute the lowercase hex HMAC-SHA256 of `payload` keyed by `secret`.
pub fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = mac_for(secret);
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Full header value: `sha256=<hex>`.
pub fn signature_header(payload: &[u8], secret: &str) -> String {
    format!("{SIGNATURE_PREFIX}{}", sign(payload, secret))
}

/// Check `candidate` against the signature of `payload` under `secret`.
///
/// Accepts the bare hex digest or the prefixed header form. The comparison
/// runs in constant time; malformed hex is simply a mismatch.
pub fn verify(payload: &[u8], secret: &str, candidate: &str) -> bool {
    let digest = candidate.strip_prefix(SIGNATURE_PREFIX).unwrap_or(candidate);
    let Ok(expected) = hex::decode(digest) else {
        return false;
    };

    let mut mac = mac_for(secret);
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
