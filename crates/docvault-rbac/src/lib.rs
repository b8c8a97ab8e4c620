//! # DocVault RBAC
//!
//! Role-based access control: given an actor's role and a target scope
//! (plus an optional field name), compute the effective access level.
//!
//! ## Model
//!
//! - [`Role`] carries an ordered set of [`ScopeRule`]s; a super role
//!   bypasses all checks.
//! - [`ScopeRule`] grants an [`AccessLevel`] on one [`Scope`]; its
//!   [`FieldRule`]s override the level for individual fields.
//! - Resolution fails closed: unknown roles and scopes resolve to
//!   [`AccessLevel::None`].
//!
//! Role and actor lookup goes through the [`RoleRepository`] trait so any
//! persistence backend can stand in.

pub mod actor;
pub mod engine;
pub mod error;
pub mod level;
pub mod repository;
pub mod role;
pub mod rule;
pub mod scope;

pub use actor::Actor;
pub use engine::{resolve, RbacEngine};
pub use error::{RbacError, Result};
pub use level::AccessLevel;
pub use repository::{MemoryRoleStore, RoleRepository};
pub use role::Role;
pub use rule::{FieldRule, ScopeRule};
pub use scope::Scope;
