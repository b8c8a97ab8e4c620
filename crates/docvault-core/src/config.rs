//! Vault configuration.
//!
//! Configuration is an explicit value constructed once at startup and passed
//! into each component's constructor. Secrets are parsed and validated here;
//! nothing downstream reads a global.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::keys::{CipherKey, MacKey};

/// Key-derivation context for the bearer-token MAC key.
const TOKEN_MAC_CONTEXT: &str = "docvault-token-v0-mac";

/// Key-derivation context for the signed-URL MAC key.
const URL_MAC_CONTEXT: &str = "docvault-url-v0-mac";

/// Key-derivation context for signed-URL transit encryption.
const URL_SEAL_CONTEXT: &str = "docvault-url-v0-seal";

/// AEAD transformation used for streams at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgorithm {
    /// ChaCha20-Poly1305 with 256-bit key, 96-bit IV, 128-bit tag.
    ChaCha20Poly1305,
}

impl CipherAlgorithm {
    /// Parse a configured transformation name.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "chacha20poly1305" | "chacha20-poly1305" => Ok(Self::ChaCha20Poly1305),
            other => Err(ConfigError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// The IV length the algorithm expects, in bytes.
    pub const fn iv_len(&self) -> usize {
        12
    }
}

/// Configuration for the stream cipher engine.
#[derive(Clone)]
pub struct CipherConfig {
    pub algorithm: CipherAlgorithm,
    pub key: CipherKey,
}

/// Configuration for the bearer-token service.
#[derive(Clone)]
pub struct TokenConfig {
    /// MAC key derived from the configured token secret.
    pub key: MacKey,
    pub issuer: String,
    pub audience: String,
    /// Token lifetime in seconds.
    pub lifetime_secs: i64,
}

/// Configuration for the signed-URL service.
#[derive(Clone)]
pub struct UrlConfig {
    /// MAC key derived from the configured URL secret.
    pub key: MacKey,
    /// Key for transit encryption of URL payloads.
    pub seal_key: CipherKey,
    /// Whether URL payloads are encrypted in transit.
    pub encrypt_payload: bool,
    /// Validity window in seconds.
    pub expiry_secs: i64,
}

/// The assembled vault configuration.
#[derive(Clone)]
pub struct VaultConfig {
    pub cipher: CipherConfig,
    pub token: TokenConfig,
    pub url: UrlConfig,
    /// When false, authorization guards are no-ops (authentication still applies).
    pub rbac_enabled: bool,
    /// Root directory for encrypted blobs.
    pub storage_root: PathBuf,
}

/// Raw settings as a deployment supplies them.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    /// Transformation name, e.g. "chacha20poly1305".
    pub cipher_algorithm: String,
    /// Hex-encoded 256-bit cipher key.
    pub cipher_key_hex: String,
    pub token_secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_lifetime_secs: i64,
    pub url_secret: String,
    pub url_expiry_secs: i64,
    pub url_encrypt_payload: bool,
    pub rbac_enabled: bool,
    pub storage_root: PathBuf,
}

impl VaultConfig {
    /// Validate raw settings and derive key material.
    pub fn from_settings(settings: &VaultSettings) -> Result<Self, ConfigError> {
        let algorithm = CipherAlgorithm::parse(&settings.cipher_algorithm)?;
        let key = CipherKey::from_hex(&settings.cipher_key_hex)?;

        if settings.token_secret.is_empty() {
            return Err(ConfigError::EmptyField("token secret"));
        }
        if settings.url_secret.is_empty() {
            return Err(ConfigError::EmptyField("URL secret"));
        }
        if settings.token_secret == settings.url_secret {
            return Err(ConfigError::SharedSecret);
        }
        if settings.issuer.is_empty() {
            return Err(ConfigError::EmptyField("issuer"));
        }
        if settings.audience.is_empty() {
            return Err(ConfigError::EmptyField("audience"));
        }
        if settings.token_lifetime_secs <= 0 {
            return Err(ConfigError::ZeroDuration("token lifetime"));
        }
        if settings.url_expiry_secs <= 0 {
            return Err(ConfigError::ZeroDuration("URL expiry window"));
        }

        Ok(Self {
            cipher: CipherConfig { algorithm, key },
            token: TokenConfig {
                key: MacKey::derive(settings.token_secret.as_bytes(), TOKEN_MAC_CONTEXT),
                issuer: settings.issuer.clone(),
                audience: settings.audience.clone(),
                lifetime_secs: settings.token_lifetime_secs,
            },
            url: UrlConfig {
                key: MacKey::derive(settings.url_secret.as_bytes(), URL_MAC_CONTEXT),
                seal_key: CipherKey::from_bytes(blake3::derive_key(
                    URL_SEAL_CONTEXT,
                    settings.url_secret.as_bytes(),
                )),
                encrypt_payload: settings.url_encrypt_payload,
                expiry_secs: settings.url_expiry_secs,
            },
            rbac_enabled: settings.rbac_enabled,
            storage_root: settings.storage_root.clone(),
        })
    }
}
