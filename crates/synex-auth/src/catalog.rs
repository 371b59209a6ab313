//! Permission catalog: permissions, UI groups and the predefined seed.

use std::collections::BTreeMap;

use synex_core::catalog::{predefined_groups, predefined_permissions};
use synex_core::error::{SynexError, SynexResult};
use synex_core::models::permission::{CreatePermission, Permission, UpdatePermission};
use synex_core::models::permission_group::{
    CreatePermissionGroup, PermissionGroup, PermissionGroupWithPermissions, UpdatePermissionGroup,
};
use synex_core::repository::{
    PermissionGroupRepository, PermissionRepository, PermissionStore, RolePermissionRepository,
    UserPermissionRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of [`CatalogService::seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub groups_created: usize,
}

/// Catalog administration.
///
/// Name uniqueness among active permissions is enforced by the store, in
/// the same transaction as the write.
pub struct CatalogService<S: PermissionStore> {
    store: S,
}

impl<S: PermissionStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Active permissions ordered by `(module, action)`.
    pub async fn list_all(&self) -> SynexResult<Vec<Permission>> {
        self.store.permissions().list_active().await
    }

    pub async fn list_by_module(&self, module: &str) -> SynexResult<Vec<Permission>> {
        self.store.permissions().list_by_module(module).await
    }

    pub async fn find_by_name(&self, name: &str) -> SynexResult<Permission> {
        self.store.permissions().get_by_name(name.trim()).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> SynexResult<Permission> {
        self.store.permissions().get_by_id(id).await
    }

    pub async fn create(&self, input: CreatePermission) -> SynexResult<Permission> {
        if input.module.trim().is_empty() || input.action.trim().is_empty() {
            return Err(SynexError::validation("module and action are required"));
        }

        let permission = self.store.permissions().create(input).await?;
        info!(
            permission_id = %permission.id,
            name = %permission.name,
            "Permission created"
        );
        Ok(permission)
    }

    /// Partial update of description and active flag.
    pub async fn update(&self, id: Uuid, input: UpdatePermission) -> SynexResult<Permission> {
        let permission = self.store.permissions().update(id, input).await?;
        info!(
            permission_id = %id,
            is_active = permission.is_active,
            "Permission updated"
        );
        Ok(permission)
    }

    /// Soft delete, refused while an active role binding or user override
    /// still references the permission.
    pub async fn delete(&self, id: Uuid) -> SynexResult<()> {
        self.store.permissions().get_by_id(id).await?;

        let references = self
            .store
            .role_bindings()
            .count_active_for_permission(id)
            .await?
            + self
                .store
                .overrides()
                .count_active_for_permission(id)
                .await?;
        if references > 0 {
            return Err(SynexError::InUse {
                entity: "permission".into(),
                id: id.to_string(),
                references,
            });
        }

        self.store.permissions().soft_delete(id).await?;
        info!(permission_id = %id, "Permission deleted");
        Ok(())
    }

    /// Active groups in sort order, each with its module's active
    /// permissions.
    pub async fn list_groups(&self) -> SynexResult<Vec<PermissionGroupWithPermissions>> {
        let groups = self.store.groups().list_active().await?;

        let mut by_module: BTreeMap<String, Vec<Permission>> = BTreeMap::new();
        for permission in self.store.permissions().list_active().await? {
            by_module
                .entry(permission.module.clone())
                .or_default()
                .push(permission);
        }

        Ok(groups
            .into_iter()
            .map(|group| PermissionGroupWithPermissions {
                permissions: by_module.get(&group.module).cloned().unwrap_or_default(),
                group,
            })
            .collect())
    }

    pub async fn create_group(&self, input: CreatePermissionGroup) -> SynexResult<PermissionGroup> {
        if input.group_name.trim().is_empty() || input.module.trim().is_empty() {
            return Err(SynexError::validation("group name and module are required"));
        }
        match self.store.groups().get_by_name(&input.group_name).await {
            Ok(_) => {
                return Err(SynexError::already_exists(
                    "permission_group",
                    input.group_name.trim().to_uppercase(),
                ));
            }
            Err(SynexError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let group = self.store.groups().create(input).await?;
        info!(group_id = %group.id, group_name = %group.group_name, "Permission group created");
        Ok(group)
    }

    pub async fn update_group(
        &self,
        id: Uuid,
        input: UpdatePermissionGroup,
    ) -> SynexResult<PermissionGroup> {
        self.store.groups().update(id, input).await
    }

    pub async fn delete_group(&self, id: Uuid) -> SynexResult<()> {
        self.store.groups().soft_delete(id).await?;
        info!(group_id = %id, "Permission group deleted");
        Ok(())
    }

    /// Insert every predefined permission and group whose name is missing.
    /// Existing rows, including deactivated ones, are left as they are.
    pub async fn seed_catalog(&self) -> SynexResult<SeedReport> {
        let mut report = SeedReport::default();

        for input in predefined_permissions() {
            let name = input.canonical_name();
            match self.store.permissions().get_by_name(&name).await {
                Ok(_) => debug!(%name, "Permission already present"),
                Err(SynexError::NotFound { .. }) => {
                    self.store.permissions().create(input).await?;
                    report.permissions_created += 1;
                }
                Err(e) => return Err(e),
            }
        }

        for input in predefined_groups() {
            match self.store.groups().get_by_name(&input.group_name).await {
                Ok(_) => debug!(group_name = %input.group_name, "Group already present"),
                Err(SynexError::NotFound { .. }) => {
                    self.store.groups().create(input).await?;
                    report.groups_created += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            permissions_created = report.permissions_created,
            groups_created = report.groups_created,
            "Permission catalog seeded"
        );
        Ok(report)
    }
}
