//! Effective-permission algebra.
//!
//! Everything here is pure: callers load a user's role bindings and direct
//! overrides from the store and pass them in together with the evaluation
//! instant. The decision rule is
//!
//! ```text
//! allowed = (role_granted || direct_grant) && !direct_deny
//! ```
//!
//! so an in-effect DENY override always wins over any number of roles or
//! grants.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::binding::RolePermissionBinding;
use crate::models::permission::{Permission, permission_name};
use crate::models::user_permission::{GrantType, UserPermissionOverride};

/// A `(module, action, resource?)` permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionQuery {
    pub module: String,
    pub action: String,
    pub resource: Option<String>,
}

impl PermissionQuery {
    pub fn new(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        self.resource = (!resource.trim().is_empty()).then_some(resource);
        self
    }

    /// Module and action are both non-blank.
    pub fn is_well_formed(&self) -> bool {
        !self.module.trim().is_empty() && !self.action.trim().is_empty()
    }

    /// `MODULE_ACTION` or `MODULE_ACTION_RESOURCE`, uppercased.
    pub fn canonical_name(&self) -> String {
        permission_name(&self.module, &self.action, self.resource.as_deref())
    }

    /// A permission matches when its canonical name equals the query's,
    /// or when its `(module, action)` pair matches regardless of resource.
    pub fn matches(&self, permission: &Permission) -> bool {
        let module = self.module.trim();
        let action = self.action.trim();
        permission.name == self.canonical_name()
            || (permission.module.eq_ignore_ascii_case(module)
                && permission.action.eq_ignore_ascii_case(action))
    }
}

/// The three independent sources feeding a single decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEvaluation {
    /// At least one of the user's roles holds a matching in-effect binding.
    pub role_granted: bool,
    /// A matching in-effect GRANT override exists.
    pub direct_grant: bool,
    /// A matching in-effect DENY override exists.
    pub direct_deny: bool,
}

impl PermissionEvaluation {
    pub fn allows(&self) -> bool {
        (self.role_granted || self.direct_grant) && !self.direct_deny
    }
}

/// Evaluate one query against a user's bindings and overrides at `now`.
pub fn evaluate(
    query: &PermissionQuery,
    role_bindings: &[RolePermissionBinding],
    overrides: &[UserPermissionOverride],
    now: DateTime<Utc>,
) -> PermissionEvaluation {
    if !query.is_well_formed() {
        return PermissionEvaluation::default();
    }

    let role_granted = role_bindings
        .iter()
        .any(|b| b.is_in_effect(now) && query.matches(&b.permission));

    let mut evaluation = PermissionEvaluation {
        role_granted,
        ..Default::default()
    };

    for o in overrides
        .iter()
        .filter(|o| o.is_in_effect(now) && query.matches(&o.permission))
    {
        match o.grant_type {
            GrantType::Grant => evaluation.direct_grant = true,
            GrantType::Deny => evaluation.direct_deny = true,
        }
    }

    evaluation
}

/// `(role-derived ∪ direct GRANT) − direct DENY`, deduplicated by id and
/// ordered by `(module, action)`.
pub fn effective_permissions(
    role_bindings: &[RolePermissionBinding],
    overrides: &[UserPermissionOverride],
    now: DateTime<Utc>,
) -> Vec<Permission> {
    let denied: HashSet<Uuid> = overrides
        .iter()
        .filter(|o| o.is_in_effect(now) && o.grant_type == GrantType::Deny)
        .map(|o| o.permission.id)
        .collect();

    let mut granted: HashMap<Uuid, &Permission> = HashMap::new();
    let from_roles = role_bindings
        .iter()
        .filter(|b| b.is_in_effect(now))
        .map(|b| &b.permission);
    let from_overrides = overrides
        .iter()
        .filter(|o| o.is_in_effect(now) && o.grant_type == GrantType::Grant)
        .map(|o| &o.permission);

    for permission in from_roles.chain(from_overrides) {
        if !denied.contains(&permission.id) {
            granted.entry(permission.id).or_insert(permission);
        }
    }

    let mut permissions: Vec<Permission> = granted.into_values().cloned().collect();
    sort_permissions(&mut permissions);
    permissions
}

/// Catalog ordering: module, then action, then name as a tiebreak.
pub fn sort_permissions(permissions: &mut [Permission]) {
    permissions.sort_by(|a, b| {
        a.module
            .cmp(&b.module)
            .then_with(|| a.action.cmp(&b.action))
            .then_with(|| a.name.cmp(&b.name))
    });
}
