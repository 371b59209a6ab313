//! Role-permission binding model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::Permission;

/// A persisted role -> permission grant, joined with the permission it
/// points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermissionBinding {
    pub role_id: Uuid,
    pub permission: Permission,
    /// User who performed the assignment.
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl RolePermissionBinding {
    /// Active, unexpired, and pointing at an active permission.
    pub fn is_in_effect(&self, now: DateTime<Utc>) -> bool {
        in_effect(self.is_active, self.expires_at, now) && self.permission.is_active
    }
}

/// Input for replacing the permission set of a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRolePermissions {
    pub role_id: Uuid,
    pub permission_ids: Vec<Uuid>,
    pub granted_by: Uuid,
    /// Applied to every binding written by this assignment.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AssignRolePermissions {
    pub fn new(role_id: Uuid, permission_ids: Vec<Uuid>, granted_by: Uuid) -> Self {
        Self {
            role_id,
            permission_ids,
            granted_by,
            expires_at: None,
        }
    }
}

/// Shared temporal validity rule for role bindings and user overrides.
///
/// An expiry equal to `now` is already expired.
pub fn in_effect(is_active: bool, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    is_active && expires_at.is_none_or(|at| at > now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn inactive_is_never_in_effect() {
        assert!(!in_effect(false, None, Utc::now()));
    }

    #[test]
    fn open_ended_active_binding_is_in_effect() {
        assert!(in_effect(true, None, Utc::now()));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!in_effect(true, Some(now), now));
        assert!(!in_effect(true, Some(now - Duration::seconds(1)), now));
        assert!(in_effect(true, Some(now + Duration::seconds(1)), now));
    }
}
