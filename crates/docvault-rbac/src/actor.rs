//! Actors (user accounts) and credential hashing.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};

use docvault_core::{ActorId, RoleId};

use crate::error::{RbacError, Result};

/// A user account with its assigned role.
///
/// The credential is stored as an Argon2 PHC string; the plaintext password
/// never leaves the constructor or verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique actor identifier.
    pub id: ActorId,

    /// Unique username.
    pub username: String,

    /// Argon2 PHC credential hash.
    pub credential_hash: String,

    /// Locked actors cannot authenticate.
    pub locked: bool,

    /// The actor's assigned role.
    pub role_id: RoleId,
}

impl Actor {
    /// Create an actor, hashing the supplied password.
    pub fn new(username: impl Into<String>, password: &str, role_id: RoleId) -> Result<Self> {
        Ok(Self {
            id: ActorId::generate(),
            username: username.into(),
            credential_hash: hash_password(password)?,
            locked: false,
            role_id,
        })
    }

    /// Verify a password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(&self.credential_hash, password)
    }

    /// Replace the credential with a hash of the new password.
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        self.credential_hash = hash_password(password)?;
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| RbacError::CredentialHash(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| RbacError::CredentialHash(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| RbacError::CredentialHash(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_verify() {
        let actor = Actor::new("alice", "s3cret", RoleId::generate()).unwrap();
        assert!(actor.verify_password("s3cret"));
        assert!(!actor.verify_password("wrong"));
    }

    #[test]
    fn test_set_password_invalidates_old() {
        let mut actor = Actor::new("bob", "old-pass", RoleId::generate()).unwrap();
        actor.set_password("new-pass").unwrap();
        assert!(!actor.verify_password("old-pass"));
        assert!(actor.verify_password("new-pass"));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let mut actor = Actor::new("carol", "pw", RoleId::generate()).unwrap();
        actor.credential_hash = "not-a-phc-string".into();
        assert!(!actor.verify_password("pw"));
    }
}
