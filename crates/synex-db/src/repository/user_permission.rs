//! SurrealDB implementation of [`UserPermissionRepository`].
//!
//! Overrides are `overrides` edges from `user` to `permission`, unique per
//! pair. Re-granting updates the edge in place.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use synex_core::error::SynexResult;
use synex_core::models::user_permission::{
    GrantType, GrantUserPermission, UserPermissionOverride,
};
use synex_core::repository::UserPermissionRepository;
use tracing::debug;
use uuid::Uuid;

use super::permission::{PermissionRowWithId, index_permissions};
use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OverrideRow {
    user_id: String,
    permission_id: String,
    grant_type: String,
    granted_by: String,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    reason: String,
}

/// Written on both the update and the insert path of an upsert.
const OVERRIDE_FIELDS: &str = "grant_type = $grant_type, granted_by = $granted_by, \
     granted_at = $granted_at, expires_at = $expires_at, \
     is_active = true, reason = $reason";

/// SurrealDB implementation of the UserPermission repository.
#[derive(Clone)]
pub struct SurrealUserPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Load the user's overrides, optionally narrowed to one permission.
    async fn load(
        &self,
        user_id: Uuid,
        permission_id: Option<Uuid>,
    ) -> SynexResult<Vec<UserPermissionOverride>> {
        let filter = if permission_id.is_some() {
            "in = type::record('user', $user_id) \
             AND out = type::record('permission', $permission_id)"
        } else {
            "in = type::record('user', $user_id)"
        };
        let query = format!(
            "SELECT meta::id(in) AS user_id, meta::id(out) AS permission_id, \
             grant_type, granted_by, granted_at, expires_at, is_active, reason \
             FROM overrides WHERE {filter}; \
             SELECT meta::id(id) AS record_id, * FROM permission \
             WHERE deleted_at = NONE AND id IN (\
                 SELECT VALUE out FROM overrides WHERE {filter}\
             );"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("user_id", user_id.to_string()))
            .bind(("permission_id", permission_id.map(|p| p.to_string())))
            .await
            .map_err(DbError::from)?;

        let edges: Vec<OverrideRow> = result.take(0).map_err(DbError::from)?;
        let permissions: Vec<PermissionRowWithId> = result.take(1).map_err(DbError::from)?;
        let permissions = index_permissions(permissions)?;

        let mut overrides = Vec::with_capacity(edges.len());
        for edge in edges {
            let permission_id = parse_uuid(&edge.permission_id, "permission")?;
            let Some(permission) = permissions.get(&permission_id) else {
                continue;
            };
            let grant_type: GrantType = edge
                .grant_type
                .parse()
                .map_err(|_| DbError::Decode(format!("unknown grant type: {}", edge.grant_type)))?;
            overrides.push(UserPermissionOverride {
                user_id: parse_uuid(&edge.user_id, "user")?,
                permission: permission.clone(),
                grant_type,
                granted_by: parse_uuid(&edge.granted_by, "granted_by")?,
                granted_at: edge.granted_at,
                expires_at: edge.expires_at,
                is_active: edge.is_active,
                reason: edge.reason,
            });
        }

        Ok(overrides)
    }
}

impl<C: Connection> UserPermissionRepository for SurrealUserPermissionRepository<C> {
    async fn upsert(
        &self,
        input: GrantUserPermission,
        granted_at: DateTime<Utc>,
    ) -> SynexResult<UserPermissionOverride> {
        let user_id = input.user_id.to_string();
        let permission_id = input.permission_id.to_string();

        // Update the existing edge when there is one so its record id
        // survives a re-grant; relate a new edge otherwise.
        let query = format!(
            "BEGIN TRANSACTION; \
             LET $updated = (UPDATE overrides SET {OVERRIDE_FIELDS} WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('permission', $permission_id)); \
             IF array::len($updated) = 0 {{ \
                 RELATE user:`{user_id}` -> overrides -> permission:`{permission_id}` \
                 SET {OVERRIDE_FIELDS}; \
             }}; \
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("user_id", user_id.clone()))
            .bind(("permission_id", permission_id.clone()))
            .bind(("grant_type", input.grant_type.as_str().to_string()))
            .bind(("granted_by", input.granted_by.to_string()))
            .bind(("granted_at", granted_at))
            .bind(("expires_at", input.expires_at))
            .bind(("reason", input.reason.unwrap_or_default()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| {
                DbError::on_write(e, "user_permission", &format!("{user_id}:{permission_id}"))
            })?;

        debug!(
            user_id = %input.user_id,
            permission_id = %input.permission_id,
            grant_type = %input.grant_type,
            "Stored user permission override"
        );

        self.load(input.user_id, Some(input.permission_id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: "permission".into(),
                    id: permission_id,
                }
                .into()
            })
    }

    async fn delete(&self, user_id: Uuid, permission_id: Uuid) -> SynexResult<()> {
        self.db
            .query(
                "DELETE overrides WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('permission', $permission_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("permission_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> SynexResult<Vec<UserPermissionOverride>> {
        self.load(user_id, None).await
    }

    async fn count_active_for_permission(&self, permission_id: Uuid) -> SynexResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM overrides WHERE \
                 out = type::record('permission', $id) AND is_active = true \
                 GROUP ALL",
            )
            .bind(("id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
