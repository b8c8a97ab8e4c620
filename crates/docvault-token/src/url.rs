//! Signed, time-limited URLs.
//!
//! A signed URL hands off access to a document or group without a session:
//! `{base_path}?data={payload}&exp={unix_seconds}&sig={mac}`. The MAC covers
//! the data and expiry fields jointly, so mutating either invalidates the
//! URL. With transit encryption enabled the payload and expiry are sealed
//! with an AEAD before signing.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use docvault_cipher::StreamCipher;
use docvault_core::{now_secs, CipherAlgorithm, CipherConfig, DocumentId, GroupId, MacTag, UrlConfig};

/// The opaque handoff a signed URL carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlPayload {
    /// Access to a single document.
    Document(DocumentId),
    /// Access to every document in a group.
    Group(GroupId),
}

/// Signed URL validation failures.
///
/// Distinguishable so callers can log precisely; none should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UrlError {
    /// Required fields are missing or undecodable.
    #[error("signed URL is malformed")]
    Malformed,

    /// The MAC does not match the received fields.
    #[error("signed URL failed verification")]
    Tampered,

    /// The validity window has passed.
    #[error("signed URL has expired")]
    Expired,
}

/// Sealed form of the payload when transit encryption is on.
#[derive(Debug, Serialize, Deserialize)]
struct SealedData {
    payload: UrlPayload,
    exp: i64,
}

/// Issues and validates signed URLs. Stateless; safely shared.
#[derive(Clone)]
pub struct SignedUrlService {
    config: UrlConfig,
    sealer: StreamCipher,
}

impl SignedUrlService {
    /// Create a service from the URL configuration.
    pub fn new(config: UrlConfig) -> Self {
        let sealer = StreamCipher::new(&CipherConfig {
            algorithm: CipherAlgorithm::ChaCha20Poly1305,
            key: config.seal_key.clone(),
        });
        Self { config, sealer }
    }

    /// Generate a signed URL expiring after the configured window.
    pub fn generate(&self, base_path: &str, payload: UrlPayload) -> String {
        self.generate_at(base_path, payload, now_secs())
    }

    /// Generate with an explicit clock.
    pub fn generate_at(&self, base_path: &str, payload: UrlPayload, now: i64) -> String {
        let exp = now + self.config.expiry_secs;

        let data_bytes = if self.config.encrypt_payload {
            let mut plain = Vec::new();
            ciborium::into_writer(&SealedData { payload, exp }, &mut plain)
                .expect("CBOR serialization failed");
            self.sealer.seal(&plain).expect("payload sealing failed")
        } else {
            let mut plain = Vec::new();
            ciborium::into_writer(&payload, &mut plain).expect("CBOR serialization failed");
            plain
        };

        let sig = self.config.key.sign(&signing_input(&data_bytes, exp));
        format!(
            "{base_path}?data={}&exp={exp}&sig={}",
            URL_SAFE_NO_PAD.encode(&data_bytes),
            URL_SAFE_NO_PAD.encode(sig.as_bytes())
        )
    }

    /// Validate a signed URL against the system clock.
    pub fn validate(&self, url: &str) -> Result<UrlPayload, UrlError> {
        self.validate_at(url, now_secs())
    }

    /// Validate with an explicit clock.
    pub fn validate_at(&self, url: &str, now: i64) -> Result<UrlPayload, UrlError> {
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or(url);

        let mut data = None;
        let mut exp = None;
        let mut sig = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("data", v)) => data = Some(v),
                Some(("exp", v)) => exp = Some(v),
                Some(("sig", v)) => sig = Some(v),
                _ => {}
            }
        }
        let (Some(data), Some(exp), Some(sig)) = (data, exp, sig) else {
            return Err(UrlError::Malformed);
        };

        let data_bytes = URL_SAFE_NO_PAD.decode(data).map_err(|_| UrlError::Malformed)?;
        let exp: i64 = exp.parse().map_err(|_| UrlError::Malformed)?;
        let sig_bytes = URL_SAFE_NO_PAD.decode(sig).map_err(|_| UrlError::Malformed)?;
        let sig_arr = <[u8; 32]>::try_from(sig_bytes.as_slice()).map_err(|_| UrlError::Malformed)?;

        if !self
            .config
            .key
            .verify(&signing_input(&data_bytes, exp), &MacTag::from_bytes(sig_arr))
        {
            return Err(UrlError::Tampered);
        }
        if now >= exp {
            return Err(UrlError::Expired);
        }

        if self.config.encrypt_payload {
            let plain = self.sealer.open(&data_bytes).map_err(|_| UrlError::Tampered)?;
            let sealed: SealedData =
                ciborium::from_reader(&plain[..]).map_err(|_| UrlError::Tampered)?;
            // The sealed expiry must agree with the signed query field.
            if sealed.exp != exp {
                return Err(UrlError::Tampered);
            }
            Ok(sealed.payload)
        } else {
            ciborium::from_reader(&data_bytes[..]).map_err(|_| UrlError::Malformed)
        }
    }
}

/// Canonical signing input: the MAC binds payload and expiry jointly.
fn signing_input(data: &[u8], exp: i64) -> Vec<u8> {
    let mut input = Vec::with_capacity(data.len() + 24);
    input.extend_from_slice(data);
    input.push(b'\n');
    input.extend_from_slice(exp.to_string().as_bytes());
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_core::{CipherKey, MacKey};

    fn config(encrypt_payload: bool) -> UrlConfig {
        UrlConfig {
            key: MacKey::derive(b"url-secret", "docvault-url-test"),
            seal_key: CipherKey::from_bytes([0x77; 32]),
            encrypt_payload,
            expiry_secs: 300,
        }
    }

    fn service(encrypt_payload: bool) -> SignedUrlService {
        SignedUrlService::new(config(encrypt_payload))
    }

    #[test]
    fn test_generate_validate_roundtrip() {
        let service = service(false);
        let payload = UrlPayload::Document(DocumentId::generate());
        let url = service.generate_at("/files/download", payload, 1_000);

        assert!(url.starts_with("/files/download?data="));
        assert_eq!(service.validate_at(&url, 1_100), Ok(payload));
    }

    #[test]
    fn test_group_payload_roundtrip() {
        let service = service(false);
        let payload = UrlPayload::Group(GroupId::generate());
        let url = service.generate_at("/files/group", payload, 1_000);
        assert_eq!(service.validate_at(&url, 1_100), Ok(payload));
    }

    #[test]
    fn test_expiry_window() {
        let service = service(false);
        let url = service.generate_at("/d", UrlPayload::Document(DocumentId::generate()), 1_000);

        assert!(service.validate_at(&url, 1_299).is_ok());
        assert_eq!(service.validate_at(&url, 1_300), Err(UrlError::Expired));
    }

    #[test]
    fn test_altered_exp_is_tampered_not_extended() {
        let service = service(false);
        let url = service.generate_at("/d", UrlPayload::Document(DocumentId::generate()), 1_000);

        // Push the expiry far into the future without re-signing.
        let stretched = url.replace("exp=1300", "exp=999999");
        assert_eq!(service.validate_at(&stretched, 1_100), Err(UrlError::Tampered));
        // Shrinking it is equally tampering, not an early expiry.
        let shrunk = url.replace("exp=1300", "exp=1001");
        assert_eq!(service.validate_at(&shrunk, 1_100), Err(UrlError::Tampered));
    }

    #[test]
    fn test_altered_data_is_tampered() {
        let service = service(false);
        let a = UrlPayload::Document(DocumentId::generate());
        let b = UrlPayload::Document(DocumentId::generate());
        let url_a = service.generate_at("/d", a, 1_000);
        let url_b = service.generate_at("/d", b, 1_000);

        // Splice b's data field into a's URL, keeping a's signature.
        let data_b = field(&url_b, "data");
        let spliced = url_a.replace(&field(&url_a, "data"), &data_b);
        assert_eq!(service.validate_at(&spliced, 1_100), Err(UrlError::Tampered));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let service = service(false);
        for url in [
            "/d",
            "/d?data=YQ",
            "/d?data=YQ&exp=1300",
            "/d?exp=1300&sig=YQ",
            "/d?data=YQ&exp=abc&sig=YQ",
            "/d?data=%%%&exp=1300&sig=YQ",
        ] {
            assert_eq!(service.validate_at(url, 1_100), Err(UrlError::Malformed), "{url}");
        }
    }

    #[test]
    fn test_encrypted_payload_roundtrip() {
        let service = service(true);
        let payload = UrlPayload::Document(DocumentId::generate());
        let url = service.generate_at("/d", payload, 1_000);

        // The payload is not readable from the URL text.
        let mut probe = Vec::new();
        ciborium::into_writer(&payload, &mut probe).unwrap();
        assert!(!url.contains(&URL_SAFE_NO_PAD.encode(&probe)));

        assert_eq!(service.validate_at(&url, 1_100), Ok(payload));
    }

    #[test]
    fn test_encrypted_payload_tamper_fails() {
        let service = service(true);
        let url = service.generate_at("/d", UrlPayload::Document(DocumentId::generate()), 1_000);

        let data = field(&url, "data");
        let mut bytes = URL_SAFE_NO_PAD.decode(&data).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = url.replace(&data, &URL_SAFE_NO_PAD.encode(&bytes));

        assert_eq!(service.validate_at(&tampered, 1_100), Err(UrlError::Tampered));
    }

    #[test]
    fn test_wrong_secret_is_tampered() {
        let issuing = service(false);
        let url = issuing.generate_at("/d", UrlPayload::Document(DocumentId::generate()), 1_000);

        let mut other = config(false);
        other.key = MacKey::derive(b"different-secret", "docvault-url-test");
        let validating = SignedUrlService::new(other);
        assert_eq!(validating.validate_at(&url, 1_100), Err(UrlError::Tampered));
    }

    /// Extract a query field's raw value from a generated URL.
    fn field(url: &str, name: &str) -> String {
        let query = url.split_once('?').unwrap().1;
        query
            .split('&')
            .find_map(|p| p.strip_prefix(&format!("{name}=")))
            .unwrap()
            .to_string()
    }
}
