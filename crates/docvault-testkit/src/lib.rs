//! # DocVault Testkit
//!
//! Testing utilities for DocVault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a fully seeded configuration, role set, and actor trio
//!   for integration scenarios
//! - **Generators**: proptest strategies for property-based testing
//! - **Failure injection**: a document store wrapper that fails on demand,
//!   for exercising batch rollback
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! let fixture = TestFixture::new().await;
//! let ctx = fixture.context_for(&fixture.editor);
//! let vault = Vault::new(fixture.config.clone(), fixture.store.clone(),
//!                        fixture.roles.clone(), Arc::new(TracingAuditSink));
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! proptest! {
//!     #[test]
//!     fn roundtrips(data in generators::payload(4096)) {
//!         // ...
//!     }
//! }
//! ```

pub mod failing;
pub mod fixtures;
pub mod generators;

pub use failing::FailingStore;
pub use fixtures::{TestFixture, ADMIN_PASSWORD, EDITOR_PASSWORD, VIEWER_PASSWORD};
