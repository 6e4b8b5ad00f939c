//! X-Hub-Signature verification: HMAC-SHA1 of the raw body keyed with the app secret.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the callback signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";

const SIGNATURE_PREFIX: &str = "sha1=";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailed {
    #[error("callback body is empty")]
    EmptyBody,
    #[error("app secret not configured")]
    MissingSecret,
    #[error("signature header missing")]
    MissingHeader,
    #[error("signature header missing sha1= prefix")]
    MalformedHeader,
    #[error("invalid hex in signature")]
    InvalidHex,
    #[error("signature mismatch")]
    Mismatch,
}

fn mac_for(app_secret: &str, body: &[u8]) -> HmacSha1 {
    let mut mac =
        HmacSha1::new_from_slice(app_secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    mac
}

/// Compute the `sha1=<hex>` header value for `body`.
pub fn sign(body: &[u8], app_secret: &str) -> String {
    let digest = mac_for(app_secret, body).finalize().into_bytes();
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest))
}

/// Verify `signature_header` against `raw_body`. Must run before the body is parsed.
pub fn verify(
    raw_body: &[u8],
    signature_header: &str,
    app_secret: &str,
) -> Result<(), VerificationFailed> {
    if raw_body.is_empty() {
        return Err(VerificationFailed::EmptyBody);
    }
    if app_secret.is_empty() {
        return Err(VerificationFailed::MissingSecret);
    }
    let hex_sig = signature_header
        .trim()
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(VerificationFailed::MalformedHeader)?;
    let provided = hex::decode(hex_sig).map_err(|_| VerificationFailed::InvalidHex)?;
    let computed = mac_for(app_secret, raw_body).finalize().into_bytes();

    if computed.len() != provided.len() {
        return Err(VerificationFailed::Mismatch);
    }
    if !bool::from(computed.as_slice().ct_eq(provided.as_slice())) {
        return Err(VerificationFailed::Mismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"object":"page","entry":[]}"#;

    #[test]
    fn sign_and_verify() {
        let header = sign(BODY, "s3cret");
        assert!(header.starts_with("sha1="));
        assert_eq!(header.len(), 5 + 40);
        assert_eq!(verify(BODY, &header, "s3cret"), Ok(()));
    }

    #[test]
    fn other_secret_fails() {
        let header = sign(BODY, "other");
        assert_eq!(
            verify(BODY, &header, "s3cret"),
            Err(VerificationFailed::Mismatch)
        );
    }

    #[test]
    fn tampered_body_fails() {
        let header = sign(BODY, "s3cret");
        assert_eq!(
            verify(br#"{"object":"page"}"#, &header, "s3cret"),
            Err(VerificationFailed::Mismatch)
        );
    }

    #[test]
    fn known_vector() {
        // RFC 2202 test case 2.
        assert_eq!(
            sign(b"what do ya want for nothing?", "Jefe"),
            "sha1=effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
    }

    #[test]
    fn long_secret_is_hashed_first() {
        let secret = "k".repeat(200);
        let header = sign(BODY, &secret);
        assert_eq!(header.len(), 5 + 40);
        assert_eq!(verify(BODY, &header, &secret), Ok(()));
        assert_eq!(
            verify(BODY, &header, &secret[..64]),
            Err(VerificationFailed::Mismatch)
        );
    }

    #[test]
    fn malformed_headers() {
        let header = sign(BODY, "s3cret");
        let bare = header.trim_start_matches("sha1=");
        assert_eq!(
            verify(BODY, bare, "s3cret"),
            Err(VerificationFailed::MalformedHeader)
        );
        assert_eq!(
            verify(BODY, "sha1=zz", "s3cret"),
            Err(VerificationFailed::InvalidHex)
        );
        assert_eq!(
            verify(BODY, "sha1=abcd", "s3cret"),
            Err(VerificationFailed::Mismatch)
        );
    }

    #[test]
    fn empty_body_and_secret() {
        assert_eq!(
            verify(b"", &sign(b"", "s3cret"), "s3cret"),
            Err(VerificationFailed::EmptyBody)
        );
        assert_eq!(
            verify(BODY, &sign(BODY, ""), ""),
            Err(VerificationFailed::MissingSecret)
        );
    }
}
