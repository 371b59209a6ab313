//! SurrealDB implementation of [`PermissionRepository`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use synex_core::error::SynexResult;
use synex_core::models::permission::{CreatePermission, Permission, UpdatePermission};
use synex_core::repository::PermissionRepository;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

/// Take the `permission_name:$name` claim for permission `$id`. Fails
/// when another permission holds the name.
const CLAIM_NAME: &str = "CREATE type::record('permission_name', $name) SET \
     permission = type::record('permission', $id); ";

/// Drop the claim on `$name`, but only if permission `$id` holds it.
const RELEASE_NAME: &str = "DELETE type::record('permission_name', $name) \
     WHERE permission = type::record('permission', $id); ";

fn check_claim(errors: HashMap<usize, surrealdb::Error>, name: &str) -> Result<(), DbError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DbError::on_batch_write(errors.into_values(), "permission", name))
    }
}

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    module: String,
    action: String,
    resource: Option<String>,
    name: String,
    description: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self, id: Uuid) -> Permission {
        Permission {
            id,
            module: self.module,
            action: self.action,
            resource: self.resource,
            name: self.name,
            description: self.description,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row shape shared with the binding and override repositories, which
/// load the permissions their edges point at.
#[derive(Debug, SurrealValue)]
pub(crate) struct PermissionRowWithId {
    record_id: String,
    module: String,
    action: String,
    resource: Option<String>,
    name: String,
    description: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PermissionRowWithId {
    pub(crate) fn try_into_permission(self) -> Result<Permission, DbError> {
        Ok(Permission {
            id: parse_uuid(&self.record_id, "permission")?,
            module: self.module,
            action: self.action,
            resource: self.resource,
            name: self.name,
            description: self.description,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Index permission rows by id for joining against edge rows.
pub(crate) fn index_permissions(
    rows: Vec<PermissionRowWithId>,
) -> Result<HashMap<Uuid, Permission>, DbError> {
    rows.into_iter()
        .map(|row| row.try_into_permission().map(|p| (p.id, p)))
        .collect()
}

fn collect(rows: Vec<PermissionRowWithId>) -> Result<Vec<Permission>, DbError> {
    rows.into_iter()
        .map(PermissionRowWithId::try_into_permission)
        .collect()
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn create(&self, input: CreatePermission) -> SynexResult<Permission> {
        let id = Uuid::new_v4();
        let name = input.canonical_name();
        let resource = input.normalized_resource();

        let query = format!(
            "BEGIN TRANSACTION; {CLAIM_NAME}\
             CREATE type::record('permission', $id) SET \
             module = $module, action = $action, resource = $resource, \
             name = $name, description = $description, is_active = true; \
             COMMIT TRANSACTION;"
        );

        let mut response = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("module", input.module.trim().to_uppercase()))
            .bind(("action", input.action.trim().to_uppercase()))
            .bind(("resource", resource))
            .bind(("name", name.clone()))
            .bind(("description", input.description.unwrap_or_default()))
            .await
            .map_err(DbError::from)?;
        check_claim(response.take_errors(), &name)?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> SynexResult<Permission> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('permission', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission".into(),
            id: id_str,
        })?;

        Ok(row.into_permission(id))
    }

    async fn get_by_name(&self, name: &str) -> SynexResult<Permission> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE name = $name AND deleted_at = NONE \
                 ORDER BY is_active DESC LIMIT 1",
            )
            .bind(("name", name.to_uppercase()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission".into(),
            id: name.into(),
        })?;

        Ok(row.try_into_permission()?)
    }

    async fn list_active(&self) -> SynexResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE is_active = true AND deleted_at = NONE \
                 ORDER BY module ASC, action ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }

    async fn list_by_module(&self, module: &str) -> SynexResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE module = $module AND is_active = true \
                 AND deleted_at = NONE \
                 ORDER BY action ASC",
            )
            .bind(("module", module.trim().to_uppercase()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }

    async fn update(&self, id: Uuid, input: UpdatePermission) -> SynexResult<Permission> {
        let current = self.get_by_id(id).await?;

        let mut sets = Vec::new();
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let mut query = String::from("BEGIN TRANSACTION; ");
        match input.is_active {
            Some(true) => {
                query.push_str(RELEASE_NAME);
                query.push_str(CLAIM_NAME);
            }
            Some(false) => query.push_str(RELEASE_NAME),
            None => {}
        }
        query.push_str(&format!(
            "UPDATE type::record('permission', $id) SET {} \
             WHERE deleted_at = NONE; \
             COMMIT TRANSACTION;",
            sets.join(", ")
        ));

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("name", current.name.clone()));

        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let mut response = builder.await.map_err(DbError::from)?;
        check_claim(response.take_errors(), &current.name)?;

        self.get_by_id(id).await
    }

    async fn soft_delete(&self, id: Uuid) -> SynexResult<()> {
        let current = self.get_by_id(id).await?;

        let query = format!(
            "BEGIN TRANSACTION; {RELEASE_NAME}\
             UPDATE type::record('permission', $id) SET \
             deleted_at = time::now(), updated_at = time::now() \
             WHERE deleted_at = NONE; \
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("name", current.name))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
