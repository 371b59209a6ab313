//! SurrealDB implementation of [`PermissionGroupRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use synex_core::error::SynexResult;
use synex_core::models::permission_group::{
    CreatePermissionGroup, PermissionGroup, UpdatePermissionGroup,
};
use synex_core::repository::PermissionGroupRepository;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct GroupRow {
    group_name: String,
    display_name: String,
    description: String,
    module: String,
    sort_order: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> PermissionGroup {
        PermissionGroup {
            id,
            group_name: self.group_name,
            display_name: self.display_name,
            description: self.description,
            module: self.module,
            sort_order: self.sort_order,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    group_name: String,
    display_name: String,
    description: String,
    module: String,
    sort_order: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<PermissionGroup, DbError> {
        Ok(PermissionGroup {
            id: parse_uuid(&self.record_id, "permission group")?,
            group_name: self.group_name,
            display_name: self.display_name,
            description: self.description,
            module: self.module,
            sort_order: self.sort_order,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the PermissionGroup repository.
#[derive(Clone)]
pub struct SurrealPermissionGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn not_found(id: impl Into<String>) -> DbError {
        DbError::NotFound {
            entity: "permission_group".into(),
            id: id.into(),
        }
    }
}

impl<C: Connection> PermissionGroupRepository for SurrealPermissionGroupRepository<C> {
    async fn create(&self, input: CreatePermissionGroup) -> SynexResult<PermissionGroup> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('permission_group', $id) SET \
                 group_name = $group_name, display_name = $display_name, \
                 description = $description, module = $module, \
                 sort_order = $sort_order, is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("group_name", input.group_name.trim().to_uppercase()))
            .bind(("display_name", input.display_name))
            .bind(("description", input.description))
            .bind(("module", input.module.trim().to_uppercase()))
            .bind(("sort_order", input.sort_order))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found(id_str))?;

        Ok(row.into_group(id))
    }

    async fn get_by_id(&self, id: Uuid) -> SynexResult<PermissionGroup> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('permission_group', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found(id_str))?;

        Ok(row.into_group(id))
    }

    async fn get_by_name(&self, group_name: &str) -> SynexResult<PermissionGroup> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission_group \
                 WHERE group_name = $group_name AND deleted_at = NONE LIMIT 1",
            )
            .bind(("group_name", group_name.trim().to_uppercase()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found(group_name))?;

        Ok(row.try_into_group()?)
    }

    async fn update(&self, id: Uuid, input: UpdatePermissionGroup) -> SynexResult<PermissionGroup> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.sort_order.is_some() {
            sets.push("sort_order = $sort_order");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('permission_group', $id) SET {} \
             WHERE deleted_at = NONE",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(sort_order) = input.sort_order {
            builder = builder.bind(("sort_order", sort_order));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| Self::not_found(id_str))?;

        Ok(row.into_group(id))
    }

    async fn soft_delete(&self, id: Uuid) -> SynexResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('permission_group', $id) SET \
                 deleted_at = time::now(), updated_at = time::now() \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;
        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(Self::not_found(id_str).into());
        }

        Ok(())
    }

    async fn list_active(&self) -> SynexResult<Vec<PermissionGroup>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission_group \
                 WHERE is_active = true AND deleted_at = NONE \
                 ORDER BY sort_order ASC, group_name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;

        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }
}
