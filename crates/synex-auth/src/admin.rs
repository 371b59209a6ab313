//! Role-permission and user-override administration.
//!
//! Every operation validates its inputs before touching the store, so a
//! rejected call leaves no partial state. Multi-row writes go to the store
//! as a single transaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use synex_core::error::{SynexError, SynexResult};
use synex_core::evaluation::sort_permissions;
use synex_core::models::binding::AssignRolePermissions;
use synex_core::models::permission::Permission;
use synex_core::models::user::User;
use synex_core::models::user_permission::{GrantUserPermission, UserPermissionOverride};
use synex_core::repository::{
    PermissionRepository, PermissionStore, RolePermissionRepository, RoleRepository,
    UserPermissionRepository, UserRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::config::PermissionConfig;

/// Role-derived permissions and direct overrides of one user, side by side.
#[derive(Debug, Clone, Serialize)]
pub struct UserPermissions {
    pub user: User,
    pub role_permissions: Vec<Permission>,
    pub direct: Vec<UserPermissionOverride>,
}

pub struct AdministrationService<S: PermissionStore> {
    store: S,
    config: PermissionConfig,
}

impl<S: PermissionStore> AdministrationService<S> {
    pub fn new(store: S, config: PermissionConfig) -> Self {
        Self { store, config }
    }

    // -- role bindings ---------------------------------------------------------

    /// Replace the role's permission set.
    pub async fn assign(&self, input: AssignRolePermissions) -> SynexResult<()> {
        reject_past_expiry(input.expires_at)?;
        self.require_roles(&[input.role_id]).await?;
        self.require_permissions(&input.permission_ids).await?;

        let (role_id, count) = (input.role_id, input.permission_ids.len());
        self.store.role_bindings().replace(vec![input]).await?;
        info!(%role_id, permissions = count, "Role permissions assigned");
        Ok(())
    }

    pub async fn remove(&self, role_id: Uuid, permission_ids: &[Uuid]) -> SynexResult<()> {
        self.require_roles(&[role_id]).await?;
        if permission_ids.is_empty() {
            return Ok(());
        }

        self.store
            .role_bindings()
            .remove(&[role_id], permission_ids)
            .await?;
        info!(%role_id, permissions = permission_ids.len(), "Role permissions removed");
        Ok(())
    }

    /// Permissions the role currently confers: active, unexpired bindings
    /// on active permissions.
    pub async fn list_for_role(&self, role_id: Uuid) -> SynexResult<Vec<Permission>> {
        self.require_roles(&[role_id]).await?;
        let now = Utc::now();

        let mut permissions: Vec<Permission> = self
            .store
            .role_bindings()
            .list_for_role(role_id)
            .await?
            .into_iter()
            .filter(|b| b.is_in_effect(now))
            .map(|b| b.permission)
            .collect();
        sort_permissions(&mut permissions);
        Ok(permissions)
    }

    /// Copy the source role's current permission set onto the target. The
    /// copy is a snapshot; later changes to the source do not propagate.
    pub async fn clone_role(
        &self,
        from_role_id: Uuid,
        to_role_id: Uuid,
        granted_by: Uuid,
    ) -> SynexResult<()> {
        self.require_roles(&[from_role_id, to_role_id]).await?;

        let permission_ids = self
            .list_for_role(from_role_id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        self.assign(AssignRolePermissions::new(
            to_role_id,
            permission_ids,
            granted_by,
        ))
        .await?;
        info!(%from_role_id, %to_role_id, "Role permissions cloned");
        Ok(())
    }

    /// Replace the permission set of every listed role, all or nothing.
    ///
    /// The listed permissions become each role's complete set, so an empty
    /// `permission_ids` clears every listed role. An empty `role_ids` is a
    /// no-op. Use [`Self::bulk_revoke`] to take away specific permissions.
    pub async fn bulk_assign(
        &self,
        role_ids: &[Uuid],
        permission_ids: &[Uuid],
        granted_by: Uuid,
    ) -> SynexResult<()> {
        if role_ids.is_empty() {
            return Ok(());
        }
        self.require_roles(role_ids).await?;
        self.require_permissions(permission_ids).await?;

        let assignments = role_ids
            .iter()
            .map(|role_id| AssignRolePermissions::new(*role_id, permission_ids.to_vec(), granted_by))
            .collect();
        self.store.role_bindings().replace(assignments).await?;
        info!(
            roles = role_ids.len(),
            permissions = permission_ids.len(),
            "Bulk permission assignment committed"
        );
        Ok(())
    }

    /// Remove the listed permissions from every listed role, all or nothing.
    pub async fn bulk_revoke(&self, role_ids: &[Uuid], permission_ids: &[Uuid]) -> SynexResult<()> {
        if role_ids.is_empty() {
            return Ok(());
        }
        self.require_roles(role_ids).await?;

        self.store
            .role_bindings()
            .remove(role_ids, permission_ids)
            .await?;
        info!(
            roles = role_ids.len(),
            permissions = permission_ids.len(),
            "Bulk permission revocation committed"
        );
        Ok(())
    }

    // -- user overrides --------------------------------------------------------

    /// Create or overwrite the user's override for one permission.
    pub async fn grant(&self, input: GrantUserPermission) -> SynexResult<UserPermissionOverride> {
        self.require_overrides()?;
        reject_past_expiry(input.expires_at)?;
        self.store.users().get_by_id(input.user_id).await?;
        self.store.permissions().get_by_id(input.permission_id).await?;

        let stored = self.store.overrides().upsert(input, Utc::now()).await?;
        info!(
            user_id = %stored.user_id,
            permission = %stored.permission.name,
            grant_type = %stored.grant_type,
            "User permission override stored"
        );
        Ok(stored)
    }

    /// Idempotent.
    pub async fn revoke(&self, user_id: Uuid, permission_id: Uuid) -> SynexResult<()> {
        self.require_overrides()?;
        self.store.overrides().delete(user_id, permission_id).await?;
        info!(%user_id, %permission_id, "User permission override revoked");
        Ok(())
    }

    /// Active, unexpired overrides of the user. Empty when overrides are
    /// disabled.
    pub async fn list_direct(&self, user_id: Uuid) -> SynexResult<Vec<UserPermissionOverride>> {
        if !self.config.overrides_enabled {
            return Ok(Vec::new());
        }
        let now = Utc::now();

        Ok(self
            .store
            .overrides()
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|o| o.is_in_effect(now))
            .collect())
    }

    pub async fn user_permissions(&self, user_id: Uuid) -> SynexResult<UserPermissions> {
        let user = self.store.users().get_by_id(user_id).await?;
        let now = Utc::now();

        let mut role_permissions: Vec<Permission> = Vec::new();
        for binding in self.store.role_bindings().list_for_user(user_id).await? {
            if binding.is_in_effect(now)
                && !role_permissions.iter().any(|p| p.id == binding.permission.id)
            {
                role_permissions.push(binding.permission);
            }
        }
        sort_permissions(&mut role_permissions);

        Ok(UserPermissions {
            user,
            role_permissions,
            direct: self.list_direct(user_id).await?,
        })
    }

    // -- validation ------------------------------------------------------------

    async fn require_roles(&self, role_ids: &[Uuid]) -> SynexResult<()> {
        for role_id in role_ids {
            self.store.roles().get_by_id(*role_id).await?;
        }
        Ok(())
    }

    async fn require_permissions(&self, permission_ids: &[Uuid]) -> SynexResult<()> {
        for permission_id in permission_ids {
            self.store.permissions().get_by_id(*permission_id).await?;
        }
        Ok(())
    }

    fn require_overrides(&self) -> SynexResult<()> {
        if self.config.overrides_enabled {
            Ok(())
        } else {
            Err(SynexError::validation("user permission overrides are disabled"))
        }
    }
}

fn reject_past_expiry(expires_at: Option<DateTime<Utc>>) -> SynexResult<()> {
    match expires_at {
        Some(at) if at <= Utc::now() => Err(SynexError::validation(format!(
            "expiry {at} is already in the past"
        ))),
        _ => Ok(()),
    }
}
