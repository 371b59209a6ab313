//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Binding and override readers return
//! raw rows; filtering by active flag and expiry happens in
//! [`crate::evaluation`] so that a single evaluation instant is used for the
//! whole decision.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::SynexResult;
use crate::models::{
    binding::{AssignRolePermissions, RolePermissionBinding},
    permission::{CreatePermission, Permission, UpdatePermission},
    permission_group::{CreatePermissionGroup, PermissionGroup, UpdatePermissionGroup},
    role::{CreateRole, Role},
    user::{CreateUser, User, UserStatus},
    user_permission::{GrantUserPermission, UserPermissionOverride},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub trait PermissionRepository: Send + Sync {
    /// Store a new active permission. Module, action and name are stored
    /// uppercased; the name is derived when absent. `AlreadyExists` when an
    /// active permission holds the name, checked atomically with the
    /// insert.
    fn create(
        &self,
        input: CreatePermission,
    ) -> impl Future<Output = SynexResult<Permission>> + Send;

    /// Soft-deleted permissions are reported as not found.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SynexResult<Permission>> + Send;

    /// Prefers the active row when an inactive one shares the name.
    fn get_by_name(&self, name: &str) -> impl Future<Output = SynexResult<Permission>> + Send;

    /// Active permissions ordered by `(module, action)`.
    fn list_active(&self) -> impl Future<Output = SynexResult<Vec<Permission>>> + Send;

    /// Active permissions of one module ordered by action.
    fn list_by_module(
        &self,
        module: &str,
    ) -> impl Future<Output = SynexResult<Vec<Permission>>> + Send;

    /// Reactivation fails with `AlreadyExists` when another active
    /// permission took the name meanwhile.
    fn update(
        &self,
        id: Uuid,
        input: UpdatePermission,
    ) -> impl Future<Output = SynexResult<Permission>> + Send;

    /// Soft-delete: sets `deleted_at` and frees the name.
    fn soft_delete(&self, id: Uuid) -> impl Future<Output = SynexResult<()>> + Send;
}

pub trait PermissionGroupRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePermissionGroup,
    ) -> impl Future<Output = SynexResult<PermissionGroup>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SynexResult<PermissionGroup>> + Send;
    fn get_by_name(
        &self,
        group_name: &str,
    ) -> impl Future<Output = SynexResult<PermissionGroup>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePermissionGroup,
    ) -> impl Future<Output = SynexResult<PermissionGroup>> + Send;
    fn soft_delete(&self, id: Uuid) -> impl Future<Output = SynexResult<()>> + Send;
    /// Active groups ordered by sort order.
    fn list_active(&self) -> impl Future<Output = SynexResult<Vec<PermissionGroup>>> + Send;
}

// ---------------------------------------------------------------------------
// Principals
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = SynexResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SynexResult<Role>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = SynexResult<Role>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = SynexResult<PaginatedResult<Role>>> + Send;

    /// Delete a role together with its user links and permission bindings,
    /// in one transaction.
    fn delete(&self, id: Uuid) -> impl Future<Output = SynexResult<()>> + Send;

    /// Link a user to a role. Linking twice is a no-op.
    fn assign_to_user(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = SynexResult<()>> + Send;

    /// Remove a user↔role link. No-op when absent.
    fn unassign_from_user(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = SynexResult<()>> + Send;

    fn get_user_roles(&self, user_id: Uuid) -> impl Future<Output = SynexResult<Vec<Role>>> + Send;
}

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = SynexResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SynexResult<User>> + Send;
    fn get_by_username(&self, username: &str)
    -> impl Future<Output = SynexResult<User>> + Send;
    fn update_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> impl Future<Output = SynexResult<User>> + Send;
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

pub trait RolePermissionRepository: Send + Sync {
    /// Replace the binding set of every listed role, all in one
    /// transaction. Each role's existing bindings are deleted before the
    /// new set is inserted.
    fn replace(
        &self,
        assignments: Vec<AssignRolePermissions>,
    ) -> impl Future<Output = SynexResult<()>> + Send;

    /// Delete the bindings between each listed role and each listed
    /// permission, in one transaction.
    fn remove(
        &self,
        role_ids: &[Uuid],
        permission_ids: &[Uuid],
    ) -> impl Future<Output = SynexResult<()>> + Send;

    /// Every binding of the role on a non-deleted permission.
    fn list_for_role(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = SynexResult<Vec<RolePermissionBinding>>> + Send;

    /// Every binding reachable through the user's roles.
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = SynexResult<Vec<RolePermissionBinding>>> + Send;

    /// Number of active bindings referencing the permission.
    fn count_active_for_permission(
        &self,
        permission_id: Uuid,
    ) -> impl Future<Output = SynexResult<u64>> + Send;
}

pub trait UserPermissionRepository: Send + Sync {
    /// Insert or overwrite the override keyed by `(user, permission)`.
    fn upsert(
        &self,
        input: GrantUserPermission,
        granted_at: DateTime<Utc>,
    ) -> impl Future<Output = SynexResult<UserPermissionOverride>> + Send;

    /// Hard delete. No-op when absent.
    fn delete(
        &self,
        user_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = SynexResult<()>> + Send;

    /// Every override of the user on a non-deleted permission.
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = SynexResult<Vec<UserPermissionOverride>>> + Send;

    /// Number of active overrides referencing the permission.
    fn count_active_for_permission(
        &self,
        permission_id: Uuid,
    ) -> impl Future<Output = SynexResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Store bundle
// ---------------------------------------------------------------------------

/// All repositories backed by one store.
///
/// Services take a single `S: PermissionStore` instead of one type
/// parameter per repository.
pub trait PermissionStore: Send + Sync {
    type Permissions: PermissionRepository;
    type Groups: PermissionGroupRepository;
    type Roles: RoleRepository;
    type Users: UserRepository;
    type RoleBindings: RolePermissionRepository;
    type Overrides: UserPermissionRepository;

    fn permissions(&self) -> &Self::Permissions;
    fn groups(&self) -> &Self::Groups;
    fn roles(&self) -> &Self::Roles;
    fn users(&self) -> &Self::Users;
    fn role_bindings(&self) -> &Self::RoleBindings;
    fn overrides(&self) -> &Self::Overrides;
}
