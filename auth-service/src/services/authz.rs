//! Organization/branch access decisions.
//!
//! A policy is a plain value attached to each protected route; handlers
//! call [`decide`] explicitly before touching any business logic. The
//! engine never errors: callers translate `false` into 403 Forbidden,
//! while a missing or invalid access token is a 401 handled upstream by
//! token verification.

use serde::Deserialize;

use crate::models::Role;
use crate::services::AccessTokenClaims;

/// Org/branch scoping attached to a policy. Absent scope means the role
/// check alone decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeRule {
    pub allow_cross_org: bool,
    pub allow_cross_branch: bool,
}

/// Declared requirements for one operation.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub roles: Vec<Role>,
    pub scope: Option<ScopeRule>,
}

impl AccessPolicy {
    /// Flat role check, no org/branch scoping.
    ///
    /// NOTE: under a flat policy an admin of org A passes for a target in
    /// org B, because no scope is evaluated at all. Routes that take an
    /// org from the path almost always want [`AccessPolicy::org_scoped`]
    /// instead.
    pub fn any_of(roles: impl Into<Vec<Role>>) -> Self {
        Self {
            roles: roles.into(),
            scope: None,
        }
    }

    /// Scoped to the actor's own org and branch.
    pub fn org_scoped(roles: impl Into<Vec<Role>>) -> Self {
        Self {
            roles: roles.into(),
            scope: Some(ScopeRule {
                allow_cross_org: false,
                allow_cross_branch: false,
            }),
        }
    }

    /// Scoped to the actor's own org, any branch within it.
    pub fn cross_branch(roles: impl Into<Vec<Role>>) -> Self {
        Self {
            roles: roles.into(),
            scope: Some(ScopeRule {
                allow_cross_org: false,
                allow_cross_branch: true,
            }),
        }
    }

    /// Platform-wide: any org, any branch.
    pub fn platform(roles: impl Into<Vec<Role>>) -> Self {
        Self {
            roles: roles.into(),
            scope: Some(ScopeRule {
                allow_cross_org: true,
                allow_cross_branch: true,
            }),
        }
    }
}

/// Org/branch the request is aimed at, parsed from the path or body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessTarget {
    pub org_id: Option<String>,
    pub branch_id: Option<String>,
}

impl AccessTarget {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn org(org_id: impl Into<String>) -> Self {
        Self {
            org_id: Some(org_id.into()),
            branch_id: None,
        }
    }

    pub fn org_branch(org_id: impl Into<String>, branch_id: impl Into<String>) -> Self {
        Self {
            org_id: Some(org_id.into()),
            branch_id: Some(branch_id.into()),
        }
    }
}

/// Allow/deny for an authenticated actor against a declared policy and a
/// target scope. Rules are evaluated in order; the first match decides.
///
/// Organizational ownership dominates branch restriction: an Owner acts
/// anywhere inside their own organization, never outside it. SuperAdmin
/// is the absolute escape hatch.
pub fn decide(
    actor: &AccessTokenClaims,
    policy: Option<&AccessPolicy>,
    target: &AccessTarget,
) -> bool {
    // 1. No declared policy: open endpoint.
    let Some(policy) = policy else {
        return true;
    };

    // 2. SuperAdmin bypasses everything, including scope.
    if actor.role == Role::SuperAdmin {
        return true;
    }

    // 3. Role membership is the floor.
    if !policy.roles.contains(&actor.role) {
        return false;
    }

    // 4. Flat policy: role membership alone suffices.
    let Some(scope) = policy.scope else {
        return true;
    };

    // 5. Owner authority is total within their own organization.
    if actor.role == Role::Owner {
        match (target.org_id.as_deref(), actor.org_id.as_deref()) {
            (Some(t), Some(a)) if t == a => return true,
            (None, Some(_)) => return true,
            _ => {}
        }
    }

    // 6. Cross-org admins skip the org comparison entirely.
    if actor.role == Role::Admin && scope.allow_cross_org {
        return true;
    }

    // 7. Target org, when present, must be the actor's own.
    if let Some(target_org) = target.org_id.as_deref() {
        if actor.org_id.as_deref() != Some(target_org) {
            return false;
        }
    }

    // 8. Target branch, when present and branch-restricted, must match.
    if let Some(target_branch) = target.branch_id.as_deref() {
        if !scope.allow_cross_branch && actor.branch_id.as_deref() != Some(target_branch) {
            return false;
        }
    }

    // 9. Nothing denied.
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, org_id: Option<&str>, branch_id: Option<&str>) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: "user_1".to_string(),
            email: "actor@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "Actor".to_string(),
            role,
            org_id: org_id.map(|s| s.to_string()),
            branch_id: branch_id.map(|s| s.to_string()),
            exp: 4102444800,
            iat: 0,
            jti: "jti".to_string(),
        }
    }

    #[test]
    fn test_no_policy_allows_everyone() {
        let a = actor(Role::User, None, None);
        assert!(decide(&a, None, &AccessTarget::org_branch("A", "X")));
    }

    #[test]
    fn test_super_admin_always_allowed() {
        let a = actor(Role::SuperAdmin, None, None);
        let policy = AccessPolicy::org_scoped(vec![Role::Owner]);
        assert!(decide(&a, Some(&policy), &AccessTarget::org_branch("B", "Z")));
    }

    #[test]
    fn test_role_outside_policy_denied() {
        let a = actor(Role::User, Some("A"), None);
        let policy = AccessPolicy::any_of(vec![Role::Admin, Role::Owner]);
        assert!(!decide(&a, Some(&policy), &AccessTarget::none()));
    }

    #[test]
    fn test_flat_policy_ignores_target_org() {
        // The flat fallback: role membership alone suffices, even for a
        // foreign org target.
        let a = actor(Role::Admin, Some("A"), None);
        let policy = AccessPolicy::any_of(vec![Role::Admin]);
        assert!(decide(&a, Some(&policy), &AccessTarget::org("B")));
    }

    #[test]
    fn test_owner_bypasses_branch_restriction_in_own_org() {
        let a = actor(Role::Owner, Some("A"), Some("Y"));
        let policy = AccessPolicy::org_scoped(vec![Role::Owner, Role::Admin]);
        assert!(decide(&a, Some(&policy), &AccessTarget::org_branch("A", "X")));
    }

    #[test]
    fn test_owner_denied_outside_own_org() {
        let a = actor(Role::Owner, Some("A"), None);
        let policy = AccessPolicy::org_scoped(vec![Role::Owner]);
        assert!(!decide(&a, Some(&policy), &AccessTarget::org("B")));
    }

    #[test]
    fn test_owner_allowed_with_no_target_org() {
        let a = actor(Role::Owner, Some("A"), None);
        let policy = AccessPolicy::org_scoped(vec![Role::Owner]);
        assert!(decide(&a, Some(&policy), &AccessTarget::none()));
    }

    #[test]
    fn test_orgless_owner_gets_no_owner_shortcut() {
        let a = actor(Role::Owner, None, None);
        let policy = AccessPolicy::org_scoped(vec![Role::Owner]);
        // Falls through to the org comparison and fails it.
        assert!(!decide(&a, Some(&policy), &AccessTarget::org("A")));
        // With no target org there is nothing to compare.
        assert!(decide(&a, Some(&policy), &AccessTarget::none()));
    }

    #[test]
    fn test_admin_cross_org_flag() {
        let a = actor(Role::Admin, Some("A"), None);
        let scoped = AccessPolicy::org_scoped(vec![Role::Admin]);
        assert!(!decide(&a, Some(&scoped), &AccessTarget::org("B")));

        let platform = AccessPolicy::platform(vec![Role::Admin]);
        assert!(decide(&a, Some(&platform), &AccessTarget::org("B")));
    }

    #[test]
    fn test_admin_same_org_branch_restricted() {
        let a = actor(Role::Admin, Some("A"), Some("X"));
        let policy = AccessPolicy::org_scoped(vec![Role::Admin]);
        assert!(decide(&a, Some(&policy), &AccessTarget::org_branch("A", "X")));
        assert!(!decide(&a, Some(&policy), &AccessTarget::org_branch("A", "Y")));
    }

    #[test]
    fn test_cross_branch_flag_lifts_branch_check() {
        let a = actor(Role::Admin, Some("A"), Some("X"));
        let policy = AccessPolicy::cross_branch(vec![Role::Admin]);
        assert!(decide(&a, Some(&policy), &AccessTarget::org_branch("A", "Y")));
    }

    #[test]
    fn test_user_in_own_org_and_branch() {
        let a = actor(Role::User, Some("A"), Some("X"));
        let policy = AccessPolicy::org_scoped(vec![Role::User]);
        assert!(decide(&a, Some(&policy), &AccessTarget::org_branch("A", "X")));
        assert!(!decide(&a, Some(&policy), &AccessTarget::org("B")));
    }

    #[test]
    fn test_cross_org_admin_skips_branch_check_too() {
        // First matching rule decides: the cross-org allowance at step 6
        // ends evaluation before any branch comparison.
        let a = actor(Role::Admin, Some("A"), Some("X"));
        let policy = AccessPolicy::platform(vec![Role::Admin]);
        assert!(decide(&a, Some(&policy), &AccessTarget::org_branch("B", "Z")));
    }
}
