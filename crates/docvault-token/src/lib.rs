//! # DocVault Token
//!
//! Two stateless credential mechanisms:
//!
//! - [`AccessTokenService`] issues and verifies short-lived signed bearer
//!   tokens embedding an authenticated [`CallContext`] claim.
//! - [`SignedUrlService`] issues and validates time-limited, tamper-evident
//!   URLs carrying an opaque document or group handoff.
//!
//! Both are pure cryptographic transforms keyed from configuration; there is
//! no server-side state and no revocation list. Validity is a function of
//! signature and expiry alone.

pub mod token;
pub mod url;

pub use token::{extract_bearer, AccessTokenService, InvalidReason, TokenState};
pub use url::{SignedUrlService, UrlError, UrlPayload};

pub use docvault_core::CallContext;
