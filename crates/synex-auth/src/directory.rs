//! Roles and users, as far as the permission engine needs them.

use synex_core::error::{SynexError, SynexResult};
use synex_core::models::role::{CreateRole, Role};
use synex_core::models::user::{CreateUser, User, UserStatus};
use synex_core::repository::{
    PaginatedResult, Pagination, PermissionStore, RoleRepository, UserRepository,
};
use tracing::info;
use uuid::Uuid;

pub struct DirectoryService<S: PermissionStore> {
    store: S,
}

impl<S: PermissionStore> DirectoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // -- roles ---------------------------------------------------------------

    pub async fn create_role(&self, input: CreateRole) -> SynexResult<Role> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(SynexError::validation("role name is required"));
        }
        match self.store.roles().get_by_name(name).await {
            Ok(_) => return Err(SynexError::already_exists("role", name)),
            Err(SynexError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let role = self.store.roles().create(input).await?;
        info!(role_id = %role.id, name = %role.name, "Role created");
        Ok(role)
    }

    pub async fn get_role(&self, id: Uuid) -> SynexResult<Role> {
        self.store.roles().get_by_id(id).await
    }

    pub async fn get_role_by_name(&self, name: &str) -> SynexResult<Role> {
        self.store.roles().get_by_name(name).await
    }

    pub async fn list_roles(&self, pagination: Pagination) -> SynexResult<PaginatedResult<Role>> {
        self.store.roles().list(pagination).await
    }

    /// Delete a role; its user links and permission bindings go with it.
    pub async fn delete_role(&self, id: Uuid) -> SynexResult<()> {
        self.store.roles().get_by_id(id).await?;
        self.store.roles().delete(id).await?;
        info!(role_id = %id, "Role deleted");
        Ok(())
    }

    pub async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> SynexResult<()> {
        self.store.users().get_by_id(user_id).await?;
        self.store.roles().get_by_id(role_id).await?;
        self.store.roles().assign_to_user(user_id, role_id).await?;
        info!(%user_id, %role_id, "Role assigned to user");
        Ok(())
    }

    /// Idempotent.
    pub async fn unassign_role(&self, user_id: Uuid, role_id: Uuid) -> SynexResult<()> {
        self.store.roles().unassign_from_user(user_id, role_id).await?;
        info!(%user_id, %role_id, "Role unassigned from user");
        Ok(())
    }

    pub async fn get_user_roles(&self, user_id: Uuid) -> SynexResult<Vec<Role>> {
        self.store.users().get_by_id(user_id).await?;
        self.store.roles().get_user_roles(user_id).await
    }

    // -- users ---------------------------------------------------------------

    pub async fn create_user(&self, input: CreateUser) -> SynexResult<User> {
        let username = input.username.trim();
        if username.is_empty() {
            return Err(SynexError::validation("username is required"));
        }
        match self.store.users().get_by_username(username).await {
            Ok(_) => return Err(SynexError::already_exists("user", username)),
            Err(SynexError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let user = self.store.users().create(input).await?;
        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> SynexResult<User> {
        self.store.users().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> SynexResult<User> {
        self.store.users().get_by_username(username).await
    }

    pub async fn update_user_status(&self, id: Uuid, status: UserStatus) -> SynexResult<User> {
        let user = self.store.users().update_status(id, status).await?;
        info!(user_id = %id, status = status.as_str(), "User status changed");
        Ok(user)
    }
}
