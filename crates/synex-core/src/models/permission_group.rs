//! Permission group domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::Permission;

/// A UI-facing grouping of all permissions that share a module.
///
/// Groups carry no authorization meaning; they only organise the catalog
/// for administration screens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGroup {
    pub id: Uuid,
    /// Stable identifier (e.g., `USER_MANAGEMENT`).
    pub group_name: String,
    /// Human-readable label (e.g., `User Management`).
    pub display_name: String,
    pub description: String,
    /// Module whose permissions belong to this group.
    pub module: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermissionGroup {
    pub group_name: String,
    pub display_name: String,
    pub description: String,
    pub module: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePermissionGroup {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
    pub is_active: Option<bool>,
}

/// A group together with the active permissions of its module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGroupWithPermissions {
    pub group: PermissionGroup,
    pub permissions: Vec<Permission>,
}
