//! SurrealDB implementation of [`RolePermissionRepository`].
//!
//! Bindings are `grants` edges from `role` to `permission`. Edge metadata
//! and the permissions they point at are fetched in one round trip and
//! joined here; edges on soft-deleted permissions are dropped.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use synex_core::error::SynexResult;
use synex_core::models::binding::{AssignRolePermissions, RolePermissionBinding};
use synex_core::repository::RolePermissionRepository;
use tracing::debug;
use uuid::Uuid;

use super::permission::{PermissionRowWithId, index_permissions};
use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct BindingRow {
    role_id: String,
    permission_id: String,
    granted_by: String,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
}

/// Role filter: a single role, or every role linked to a user.
const FOR_ROLE: &str = "in = type::record('role', $subject)";
const FOR_USER: &str = "in IN (\
    SELECT VALUE out FROM has_role \
    WHERE in = type::record('user', $subject))";

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// SurrealDB implementation of the RolePermission repository.
#[derive(Clone)]
pub struct SurrealRolePermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRolePermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn load(&self, filter: &str, subject: Uuid) -> SynexResult<Vec<RolePermissionBinding>> {
        let query = format!(
            "SELECT meta::id(in) AS role_id, meta::id(out) AS permission_id, \
             granted_by, granted_at, expires_at, is_active \
             FROM grants WHERE {filter}; \
             SELECT meta::id(id) AS record_id, * FROM permission \
             WHERE deleted_at = NONE AND id IN (\
                 SELECT VALUE out FROM grants WHERE {filter}\
             );"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("subject", subject.to_string()))
            .await
            .map_err(DbError::from)?;

        let edges: Vec<BindingRow> = result.take(0).map_err(DbError::from)?;
        let permissions: Vec<PermissionRowWithId> = result.take(1).map_err(DbError::from)?;
        let permissions = index_permissions(permissions)?;

        let mut bindings = Vec::with_capacity(edges.len());
        for edge in edges {
            let permission_id = parse_uuid(&edge.permission_id, "permission")?;
            let Some(permission) = permissions.get(&permission_id) else {
                continue;
            };
            bindings.push(RolePermissionBinding {
                role_id: parse_uuid(&edge.role_id, "role")?,
                permission: permission.clone(),
                granted_by: parse_uuid(&edge.granted_by, "granted_by")?,
                granted_at: edge.granted_at,
                expires_at: edge.expires_at,
                is_active: edge.is_active,
            });
        }

        Ok(bindings)
    }
}

impl<C: Connection> RolePermissionRepository for SurrealRolePermissionRepository<C> {
    async fn replace(&self, assignments: Vec<AssignRolePermissions>) -> SynexResult<()> {
        if assignments.is_empty() {
            return Ok(());
        }

        let mut query = String::from("BEGIN TRANSACTION; ");
        for (i, assignment) in assignments.iter().enumerate() {
            let role = assignment.role_id;
            query.push_str(&format!("DELETE grants WHERE in = role:`{role}`; "));
            for permission in dedup(&assignment.permission_ids) {
                query.push_str(&format!(
                    "RELATE role:`{role}` -> grants -> permission:`{permission}` SET \
                     granted_by = $granted_by_{i}, granted_at = time::now(), \
                     expires_at = $expires_at_{i}, is_active = true; "
                ));
            }
        }
        query.push_str("COMMIT TRANSACTION;");

        let mut builder = self.db.query(query);
        for (i, assignment) in assignments.iter().enumerate() {
            builder = builder
                .bind((format!("granted_by_{i}"), assignment.granted_by.to_string()))
                .bind((format!("expires_at_{i}"), assignment.expires_at));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(roles = assignments.len(), "Replaced role permission bindings");
        Ok(())
    }

    async fn remove(&self, role_ids: &[Uuid], permission_ids: &[Uuid]) -> SynexResult<()> {
        if role_ids.is_empty() || permission_ids.is_empty() {
            return Ok(());
        }

        let targets = dedup(permission_ids)
            .iter()
            .map(|p| format!("permission:`{p}`"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut query = String::from("BEGIN TRANSACTION; ");
        for role in dedup(role_ids) {
            query.push_str(&format!(
                "DELETE grants WHERE in = role:`{role}` AND out IN [{targets}]; "
            ));
        }
        query.push_str("COMMIT TRANSACTION;");

        self.db
            .query(query)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(
            roles = role_ids.len(),
            permissions = permission_ids.len(),
            "Removed role permission bindings"
        );
        Ok(())
    }

    async fn list_for_role(&self, role_id: Uuid) -> SynexResult<Vec<RolePermissionBinding>> {
        self.load(FOR_ROLE, role_id).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> SynexResult<Vec<RolePermissionBinding>> {
        self.load(FOR_USER, user_id).await
    }

    async fn count_active_for_permission(&self, permission_id: Uuid) -> SynexResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM grants WHERE \
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
