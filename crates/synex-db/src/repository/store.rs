//! [`PermissionStore`] backed by one SurrealDB handle.

use surrealdb::{Connection, Surreal};
use synex_core::repository::PermissionStore;

use super::{
    SurrealPermissionGroupRepository, SurrealPermissionRepository, SurrealRolePermissionRepository,
    SurrealRoleRepository, SurrealUserPermissionRepository, SurrealUserRepository,
};

/// Every repository, sharing the same connection.
#[derive(Clone)]
pub struct SurrealStore<C: Connection> {
    permissions: SurrealPermissionRepository<C>,
    groups: SurrealPermissionGroupRepository<C>,
    roles: SurrealRoleRepository<C>,
    users: SurrealUserRepository<C>,
    role_bindings: SurrealRolePermissionRepository<C>,
    overrides: SurrealUserPermissionRepository<C>,
}

impl<C: Connection> SurrealStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            permissions: SurrealPermissionRepository::new(db.clone()),
            groups: SurrealPermissionGroupRepository::new(db.clone()),
            roles: SurrealRoleRepository::new(db.clone()),
            users: SurrealUserRepository::new(db.clone()),
            role_bindings: SurrealRolePermissionRepository::new(db.clone()),
            overrides: SurrealUserPermissionRepository::new(db),
        }
    }
}

impl<C: Connection> PermissionStore for SurrealStore<C> {
    type Permissions = SurrealPermissionRepository<C>;
    type Groups = SurrealPermissionGroupRepository<C>;
    type Roles = SurrealRoleRepository<C>;
    type Users = SurrealUserRepository<C>;
    type RoleBindings = SurrealRolePermissionRepository<C>;
    type Overrides = SurrealUserPermissionRepository<C>;

    fn permissions(&self) -> &Self::Permissions {
        &self.permissions
    }

    fn groups(&self) -> &Self::Groups {
        &self.groups
    }

    fn roles(&self) -> &Self::Roles {
        &self.roles
    }

    fn users(&self) -> &Self::Users {
        &self.users
    }

    fn role_bindings(&self) -> &Self::RoleBindings {
        &self.role_bindings
    }

    fn overrides(&self) -> &Self::Overrides {
        &self.overrides
    }
}
