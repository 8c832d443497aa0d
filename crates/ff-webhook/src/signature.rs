// SPDX-License-Identifier: MIT

//! HMAC-SHA-256 verification of an inbound delivery's signature header.
//!
//! Mirrors the hex/HMAC idiom used for outbound delivery signing elsewhere
//! in the retrieval pack, with the comparison direction inverted: here we
//! decode a signature the caller supplied and check it against one we
//! compute ourselves, rather than producing one to send.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify `signature_header` (as received in e.g. `X-Hub-Signature-256`,
/// with an optional leading `sha256=`) against an HMAC-SHA-256 of
/// `raw_body` keyed on `secret`. Returns `true` when no `secret` is
/// configured — signature checking is opt-in per project.
pub fn verify(secret: Option<&str>, signature_header: Option<&str>, raw_body: &[u8]) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let Some(header) = signature_header else {
        return false;
    };
    let provided_hex = header.strip_prefix("sha256=").unwrap_or(header);
    let Ok(provided) = hex::decode(provided_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&provided).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::Mac;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn skips_check_when_no_secret_configured() {
        assert!(verify(None, None, b"body"));
        assert!(verify(None, Some("garbage"), b"body"));
    }

    #[test]
    fn accepts_a_correctly_signed_body() {
        let body = b"{\"ref\":\"refs/heads/main\"}";
        let header = sign("shh", body);
        assert!(verify(Some("shh"), Some(&header), body));
    }

    #[test]
    fn rejects_a_mismatched_signature() {
        let body = b"{\"ref\":\"refs/heads/main\"}";
        let header = sign("shh", body);
        assert!(!verify(Some("different-secret"), Some(&header), body));
        assert!(!verify(Some("shh"), Some(&header), b"tampered body"));
    }

    #[test]
    fn rejects_a_missing_header_when_a_secret_is_configured() {
        assert!(!verify(Some("shh"), None, b"body"));
    }

    #[test]
    fn tolerates_a_signature_with_no_sha256_prefix() {
        let body = b"payload";
        let header = sign("shh", body);
        let bare = header.strip_prefix("sha256=").unwrap();
        assert!(verify(Some("shh"), Some(bare), body));
    }
}
