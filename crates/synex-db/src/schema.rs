//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. Record ids are UUID
//! strings; user references inside edge metadata (`granted_by`) are stored
//! as strings. Enums are stored as strings with ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: permission catalog, principals, bindings
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Permissions (soft-deleted via deleted_at)
-- =======================================================================
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD module ON TABLE permission TYPE string;
DEFINE FIELD action ON TABLE permission TYPE string;
DEFINE FIELD resource ON TABLE permission TYPE option<string>;
DEFINE FIELD name ON TABLE permission TYPE string;
DEFINE FIELD description ON TABLE permission TYPE string DEFAULT '';
DEFINE FIELD is_active ON TABLE permission TYPE bool DEFAULT true;
DEFINE FIELD deleted_at ON TABLE permission TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
-- Soft-deleted and deactivated rows keep their name, so the name index
-- is not unique. Uniqueness among active rows lives in permission_name.
DEFINE INDEX idx_permission_name ON TABLE permission COLUMNS name;
DEFINE INDEX idx_permission_module ON TABLE permission COLUMNS module;

-- One claim per name held by an active, non-deleted permission. The
-- record id is the name, so a second claim fails on CREATE.
DEFINE TABLE permission_name SCHEMAFULL;
DEFINE FIELD permission ON TABLE permission_name TYPE record<permission>;

-- =======================================================================
-- Permission groups (UI organisation only)
-- =======================================================================
DEFINE TABLE permission_group SCHEMAFULL;
DEFINE FIELD group_name ON TABLE permission_group TYPE string;
DEFINE FIELD display_name ON TABLE permission_group TYPE string;
DEFINE FIELD description ON TABLE permission_group TYPE string DEFAULT '';
DEFINE FIELD module ON TABLE permission_group TYPE string;
DEFINE FIELD sort_order ON TABLE permission_group TYPE int DEFAULT 0;
DEFINE FIELD is_active ON TABLE permission_group TYPE bool DEFAULT true;
DEFINE FIELD deleted_at ON TABLE permission_group TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE permission_group TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permission_group TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permission_group_name ON TABLE permission_group \
    COLUMNS group_name;

-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD status ON TABLE user TYPE string \
    ASSERT $value IN ['Active', 'Inactive', 'Locked'];
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;

-- =======================================================================
-- Roles
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_name ON TABLE role COLUMNS name UNIQUE;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- User -> Role membership
DEFINE TABLE has_role TYPE RELATION SCHEMAFULL;
DEFINE FIELD created_at ON TABLE has_role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE has_role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_has_role_pair ON TABLE has_role COLUMNS in, out UNIQUE;

-- Role -> Permission bindings
DEFINE TABLE grants TYPE RELATION SCHEMAFULL;
DEFINE FIELD granted_by ON TABLE grants TYPE string;
DEFINE FIELD granted_at ON TABLE grants TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD expires_at ON TABLE grants TYPE option<datetime>;
DEFINE FIELD is_active ON TABLE grants TYPE bool DEFAULT true;
DEFINE INDEX idx_grants_pair ON TABLE grants COLUMNS in, out UNIQUE;
DEFINE INDEX idx_grants_out ON TABLE grants COLUMNS out;

-- User -> Permission direct overrides
DEFINE TABLE overrides TYPE RELATION SCHEMAFULL;
DEFINE FIELD grant_type ON TABLE overrides TYPE string \
    ASSERT $value IN ['GRANT', 'DENY'];
DEFINE FIELD granted_by ON TABLE overrides TYPE string;
DEFINE FIELD granted_at ON TABLE overrides TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD expires_at ON TABLE overrides TYPE option<datetime>;
DEFINE FIELD is_active ON TABLE overrides TYPE bool DEFAULT true;
DEFINE FIELD reason ON TABLE overrides TYPE string DEFAULT '';
DEFINE INDEX idx_overrides_pair ON TABLE overrides COLUMNS in, out UNIQUE;
DEFINE INDEX idx_overrides_out ON TABLE overrides COLUMNS out;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client and
/// return how many were applied.
///
/// Each migration runs in its own transaction together with its
/// `_migration` record, so a failed migration leaves neither the schema
/// change nor the version behind.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version, name FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    let mut applied = 0;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );

        let sql = format!(
            "BEGIN TRANSACTION; {} \
             CREATE _migration SET version = $version, name = $name; \
             COMMIT TRANSACTION;",
            migration.sql
        );
        db.query(sql)
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "v{} '{}': {}",
                    migration.version, migration.name, e,
                ))
            })?;

        applied += 1;
    }

    if applied == 0 {
        info!(version = current_version, "Schema is up to date");
    } else {
        info!(applied, "Migrations applied");
    }

    Ok(applied)
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
