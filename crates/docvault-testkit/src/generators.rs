//! Proptest generators for property-based testing.

use proptest::prelude::*;

use docvault_core::{ActorId, CallContext, RoleId};
use docvault_rbac::{AccessLevel, FieldRule, Role, Scope, ScopeRule};

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate an access level.
pub fn access_level() -> impl Strategy<Value = AccessLevel> {
    prop_oneof![
        Just(AccessLevel::None),
        Just(AccessLevel::View),
        Just(AccessLevel::Edit),
        Just(AccessLevel::Full),
    ]
}

/// Generate a scope.
pub fn scope() -> impl Strategy<Value = Scope> {
    prop_oneof![
        Just(Scope::Documents),
        Just(Scope::DocumentGroups),
        Just(Scope::RbacAdmin),
        Just(Scope::SystemAdmin),
        Just(Scope::AuditLog),
    ]
}

/// Generate a short lowercase identifier.
pub fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{2,11}"
}

/// Generate a field rule.
pub fn field_rule() -> impl Strategy<Value = FieldRule> {
    (ident(), access_level()).prop_map(|(field, level)| FieldRule { field, level })
}

/// Generate a scope rule with up to three field overrides.
pub fn scope_rule() -> impl Strategy<Value = ScopeRule> {
    (
        scope(),
        access_level(),
        prop::collection::vec(field_rule(), 0..=3),
    )
        .prop_map(|(scope, level, field_rules)| ScopeRule {
            scope,
            level,
            field_rules,
        })
}

/// Generate a non-super role with up to five scope rules.
pub fn role() -> impl Strategy<Value = Role> {
    (ident(), prop::collection::vec(scope_rule(), 0..=5)).prop_map(|(name, rules)| Role {
        id: RoleId::generate(),
        name,
        is_super: false,
        rules,
    })
}

/// Generate a call context.
pub fn call_context() -> impl Strategy<Value = CallContext> {
    (ident(), prop::option::of(ident())).prop_map(|(username, schema)| CallContext {
        actor_id: ActorId::generate(),
        username,
        role_id: RoleId::generate(),
        schema,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvault_rbac::resolve;

    proptest! {
        /// A field override always wins over the scope level for its field
        /// and never affects other fields.
        #[test]
        fn prop_field_override_precedence(rule in scope_rule(), other in ident()) {
            let role = Role::new("probe").with_rule(rule.clone());

            for fr in &rule.field_rules {
                // Duplicate field names can occur; the first rule wins.
                let expected = rule.field_level(&fr.field).unwrap();
                prop_assert_eq!(resolve(&role, rule.scope, Some(&fr.field)), expected);
            }
            if rule.field_level(&other).is_none() {
                prop_assert_eq!(resolve(&role, rule.scope, Some(&other)), rule.level);
            }
        }
    }
}
