//! Typed key material for DocVault.
//!
//! Wraps ChaCha20-Poly1305 keys/nonces and keyed-Blake3 MACs with strong types.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A 256-bit symmetric encryption key for ChaCha20-Poly1305.
#[derive(Clone)]
pub struct CipherKey([u8; 32]);

impl CipherKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from a hex string. The key must decode to exactly 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s.trim()).map_err(|_| CoreError::InvalidKeyEncoding)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidKeyLength { expected: 32 })?;
        Ok(Self(arr))
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherKey(..)")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherNonce(pub [u8; 12]);

impl CipherNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 12];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// A 256-bit key for keyed-Blake3 message authentication.
#[derive(Clone)]
pub struct MacKey([u8; 32]);

impl MacKey {
    /// Derive a MAC key from an arbitrary-length secret.
    ///
    /// The context string provides domain separation: the same secret
    /// derives unrelated keys under different contexts.
    pub fn derive(secret: &[u8], context: &str) -> Self {
        Self(blake3::derive_key(context, secret))
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Compute the MAC over a message.
    pub fn sign(&self, message: &[u8]) -> MacTag {
        MacTag(*blake3::keyed_hash(&self.0, message).as_bytes())
    }

    /// Verify a MAC over a message in constant time.
    pub fn verify(&self, message: &[u8], tag: &MacTag) -> bool {
        // blake3::Hash equality is constant-time
        blake3::keyed_hash(&self.0, message) == blake3::Hash::from(tag.0)
    }
}

impl fmt::Debug for MacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacKey(..)")
    }
}

/// A 32-byte keyed-Blake3 authentication tag.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacTag(pub [u8; 32]);

impl MacTag {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for MacTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacTag({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for MacTag {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_key_hex_roundtrip() {
        let key = CipherKey::generate();
        let hex = key.to_hex();
        let recovered = CipherKey::from_hex(&hex).unwrap();
        assert_eq!(key.as_bytes(), recovered.as_bytes());
    }

    #[test]
    fn test_cipher_key_rejects_short_hex() {
        assert!(matches!(
            CipherKey::from_hex("deadbeef"),
            Err(CoreError::InvalidKeyLength { expected: 32 })
        ));
    }

    #[test]
    fn test_cipher_key_rejects_bad_hex() {
        assert!(matches!(
            CipherKey::from_hex("zz"),
            Err(CoreError::InvalidKeyEncoding)
        ));
    }

    #[test]
    fn test_mac_sign_verify() {
        let key = MacKey::derive(b"secret", "docvault-test-v1");
        let message = b"hello world";
        let tag = key.sign(message);

        assert!(key.verify(message, &tag));
        assert!(!key.verify(b"hello worlD", &tag));
    }

    #[test]
    fn test_mac_key_domain_separation() {
        let k1 = MacKey::derive(b"secret", "context-a");
        let k2 = MacKey::derive(b"secret", "context-b");
        let tag = k1.sign(b"message");
        assert!(!k2.verify(b"message", &tag));
    }

    #[test]
    fn test_mac_tag_tamper() {
        let key = MacKey::derive(b"secret", "docvault-test-v1");
        let mut tag = key.sign(b"message");
        tag.0[0] ^= 0x01;
        assert!(!key.verify(b"message", &tag));
    }

    #[test]
    fn test_nonce_generation_unique() {
        let n1 = CipherNonce::generate();
        let n2 = CipherNonce::generate();
        assert_ne!(n1, n2);
    }
}
