//! The per-request call context.
//!
//! A CallContext is the authenticated identity claim attached to one request.
//! It is reconstructed from a verified token or session on every request and
//! never persisted.

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, RoleId};

/// Ephemeral authenticated-identity claim for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The authenticated actor.
    pub actor_id: ActorId,

    /// The actor's username at authentication time.
    pub username: String,

    /// The actor's assigned role.
    pub role_id: RoleId,

    /// Optional schema/tenant tag.
    pub schema: Option<String>,
}

impl CallContext {
    /// Create a context without a tenant tag.
    pub fn new(actor_id: ActorId, username: impl Into<String>, role_id: RoleId) -> Self {
        Self {
            actor_id,
            username: username.into(),
            role_id,
            schema: None,
        }
    }

    /// Attach a schema/tenant tag.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}
