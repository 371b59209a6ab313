//! Permission domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single grantable capability, addressed by `(module, action, resource)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub id: Uuid,
    /// Coarse namespace (e.g., `USER`, `SAMPLE`).
    pub module: String,
    /// Verb within the module (e.g., `VIEW`, `DISPATCH`).
    pub action: String,
    /// Optional sub-scope within the module/action pair.
    pub resource: Option<String>,
    /// Canonical name, `MODULE_ACTION` or `MODULE_ACTION_RESOURCE`.
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreatePermission {
    pub module: String,
    pub action: String,
    pub resource: Option<String>,
    /// Explicit canonical name. Derived from module/action/resource when
    /// absent.
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CreatePermission {
    pub fn new(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
            ..Default::default()
        }
    }

    /// The uppercased name this permission will be stored under.
    pub fn canonical_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_uppercase(),
            _ => permission_name(&self.module, &self.action, self.resource.as_deref()),
        }
    }

    /// Normalized resource: trimmed, `None` when blank.
    pub fn normalized_resource(&self) -> Option<String> {
        self.resource
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePermission {
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Build the canonical permission name: `MODULE_ACTION[_RESOURCE]`,
/// uppercased. A blank resource is treated as absent.
pub fn permission_name(module: &str, action: &str, resource: Option<&str>) -> String {
    let mut name = format!("{}_{}", module.trim(), action.trim());
    if let Some(resource) = resource.map(str::trim).filter(|r| !r.is_empty()) {
        name.push('_');
        name.push_str(resource);
    }
    name.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_without_resource() {
        assert_eq!(permission_name("user", "view", None), "USER_VIEW");
    }

    #[test]
    fn name_with_resource() {
        assert_eq!(
            permission_name("sample", "view", Some("price")),
            "SAMPLE_VIEW_PRICE"
        );
    }

    #[test]
    fn blank_resource_is_ignored() {
        assert_eq!(permission_name("ORDER", "SHIP", Some("  ")), "ORDER_SHIP");
    }

    #[test]
    fn explicit_name_wins_over_derivation() {
        let input = CreatePermission {
            name: Some("custom_name".into()),
            ..CreatePermission::new("USER", "VIEW")
        };
        assert_eq!(input.canonical_name(), "CUSTOM_NAME");
    }

    #[test]
    fn blank_explicit_name_falls_back_to_derivation() {
        let input = CreatePermission {
            name: Some(" ".into()),
            resource: Some("reports".into()),
            ..CreatePermission::new("report", "export")
        };
        assert_eq!(input.canonical_name(), "REPORT_EXPORT_REPORTS");
    }
}
