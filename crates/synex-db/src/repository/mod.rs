//! SurrealDB repository implementations.

mod permission;
mod permission_group;
mod role;
mod role_permission;
mod store;
mod user;
mod user_permission;

pub use permission::SurrealPermissionRepository;
pub use permission_group::SurrealPermissionGroupRepository;
pub use role::SurrealRoleRepository;
pub use role_permission::SurrealRolePermissionRepository;
pub use store::SurrealStore;
pub use user::SurrealUserRepository;
pub use user_permission::SurrealUserPermissionRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID '{raw}': {e}")))
}
