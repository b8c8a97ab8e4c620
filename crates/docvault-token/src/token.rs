//! Bearer access tokens.
//!
//! A token is `base64url(claims_cbor) . base64url(mac)` where the MAC is a
//! keyed Blake3 hash of the claim bytes. Verification checks the signature
//! before anything else; `Expired` is only ever reported for authentically
//! signed tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use docvault_core::{now_secs, CallContext, MacTag, TokenConfig};

/// The bearer scheme prefix, matched case-insensitively.
const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Claims {
    iss: String,
    aud: String,
    /// Expiry, Unix seconds.
    exp: i64,
    /// The authenticated identity.
    ctx: CallContext,
}

/// Outcome of token verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    /// Signature and all checks passed.
    Valid(CallContext),
    /// Signature valid but the expiry has passed.
    Expired,
    /// Any other failure.
    Invalid(InvalidReason),
}

impl TokenState {
    /// The verified context, if valid.
    pub fn context(self) -> Option<CallContext> {
        match self {
            TokenState::Valid(ctx) => Some(ctx),
            _ => None,
        }
    }
}

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The Authorization value did not start with `Bearer `.
    MissingBearerPrefix,
    /// The token text could not be parsed.
    Malformed,
    /// The MAC did not verify.
    BadSignature,
    /// The `iss` claim does not match configuration.
    IssuerMismatch,
    /// The `aud` claim does not match configuration.
    AudienceMismatch,
}

/// Extract the token from an Authorization header value.
///
/// Requires the exact scheme prefix `Bearer ` (case-insensitive). Absence or
/// a malformed prefix is an outcome, not a crash.
pub fn extract_bearer(header: &str) -> Result<&str, InvalidReason> {
    let Some(scheme) = header.get(..BEARER_PREFIX.len()) else {
        return Err(InvalidReason::MissingBearerPrefix);
    };
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return Err(InvalidReason::MissingBearerPrefix);
    }
    let token = header[BEARER_PREFIX.len()..].trim();
    if token.is_empty() {
        return Err(InvalidReason::Malformed);
    }
    Ok(token)
}

/// Issues and verifies bearer tokens. Stateless; safely shared.
#[derive(Clone)]
pub struct AccessTokenService {
    config: TokenConfig,
}

impl AccessTokenService {
    /// Create a service from the token configuration.
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Issue a token for the context, expiring after the configured lifetime.
    pub fn issue(&self, ctx: &CallContext) -> String {
        self.issue_at(ctx, now_secs())
    }

    /// Issue with an explicit clock.
    pub fn issue_at(&self, ctx: &CallContext, now: i64) -> String {
        let claims = Claims {
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: now + self.config.lifetime_secs,
            ctx: ctx.clone(),
        };
        let mut body = Vec::new();
        ciborium::into_writer(&claims, &mut body).expect("CBOR serialization failed");
        let mac = self.config.key.sign(&body);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&body),
            URL_SAFE_NO_PAD.encode(mac.as_bytes())
        )
    }

    /// Verify a token against the system clock.
    pub fn verify(&self, token: &str) -> TokenState {
        self.verify_at(token, now_secs())
    }

    /// Verify with an explicit clock.
    pub fn verify_at(&self, token: &str, now: i64) -> TokenState {
        let Some((body_b64, mac_b64)) = token.split_once('.') else {
            return TokenState::Invalid(InvalidReason::Malformed);
        };
        let Ok(body) = URL_SAFE_NO_PAD.decode(body_b64) else {
            return TokenState::Invalid(InvalidReason::Malformed);
        };
        let Ok(mac_bytes) = URL_SAFE_NO_PAD.decode(mac_b64) else {
            return TokenState::Invalid(InvalidReason::Malformed);
        };
        let Ok(mac_arr) = <[u8; 32]>::try_from(mac_bytes.as_slice()) else {
            return TokenState::Invalid(InvalidReason::Malformed);
        };

        if !self.config.key.verify(&body, &MacTag::from_bytes(mac_arr)) {
            return TokenState::Invalid(InvalidReason::BadSignature);
        }

        let Ok(claims) = ciborium::from_reader::<Claims, _>(&body[..]) else {
            return TokenState::Invalid(InvalidReason::Malformed);
        };

        if claims.aud != self.config.audience {
            return TokenState::Invalid(InvalidReason::AudienceMismatch);
        }
        if claims.iss != self.config.issuer {
            return TokenState::Invalid(InvalidReason::IssuerMismatch);
        }
        if now >= claims.exp {
            return TokenState::Expired;
        }

        TokenState::Valid(claims.ctx)
    }

    /// Extract the bearer token from a header value and verify it.
    pub fn verify_header(&self, header: &str) -> TokenState {
        match extract_bearer(header) {
            Ok(token) => self.verify(token),
            Err(reason) => TokenState::Invalid(reason),
        }
    }
}
