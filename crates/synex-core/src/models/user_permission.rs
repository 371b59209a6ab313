//! Direct user permission overrides.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::binding::in_effect;
use super::permission::Permission;
use crate::error::SynexError;

/// Whether a direct override adds or removes access.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum GrantType {
    Grant,
    Deny,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Grant => "GRANT",
            GrantType::Deny => "DENY",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = SynexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GRANT" => Ok(GrantType::Grant),
            "DENY" => Ok(GrantType::Deny),
            other => Err(SynexError::validation(format!(
                "unknown grant type '{other}', expected GRANT or DENY"
            ))),
        }
    }
}

/// A per-user GRANT or DENY that supersedes role-derived access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPermissionOverride {
    pub user_id: Uuid,
    pub permission: Permission,
    pub grant_type: GrantType,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub reason: String,
}

impl UserPermissionOverride {
    /// Active, unexpired, and pointing at an active permission.
    pub fn is_in_effect(&self, now: DateTime<Utc>) -> bool {
        in_effect(self.is_active, self.expires_at, now) && self.permission.is_active
    }
}

/// Input for granting (or overwriting) a direct override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantUserPermission {
    pub user_id: Uuid,
    pub permission_id: Uuid,
    pub grant_type: GrantType,
    pub granted_by: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}
