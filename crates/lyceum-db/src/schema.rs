//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as string record ids via `type::record(...)`;
//! enums are stored as strings with ASSERT constraints. Association
//! tables reference their owners through record links so that
//! list queries can traverse them in WHERE clauses and projections.

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
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users (identities; at most one employee or student record each)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE option<string>;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD phone_number ON TABLE user TYPE string;
DEFINE FIELD token ON TABLE user TYPE option<string>;
DEFINE FIELD activation_status ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD profile ON TABLE user TYPE string \
    ASSERT $value IN ['INSTITUTE', 'ADMIN', 'OWNER', 'STUDENT', 'EMPLOYEE'];
DEFINE FIELD created_at ON TABLE user TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Institutes (tenants)
-- =======================================================================
DEFINE TABLE institute SCHEMAFULL;
DEFINE FIELD cnpj ON TABLE institute TYPE string;
DEFINE FIELD trading_name ON TABLE institute TYPE string;
DEFINE FIELD corporate_name ON TABLE institute TYPE string;
DEFINE FIELD address ON TABLE institute TYPE object FLEXIBLE;
DEFINE FIELD created_at ON TABLE institute TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_institute_cnpj ON TABLE institute COLUMNS cnpj UNIQUE;

-- =======================================================================
-- Employees (user <-> institute association; institute fixed at creation)
-- =======================================================================
DEFINE TABLE employee SCHEMAFULL;
DEFINE FIELD user ON TABLE employee TYPE record<user>;
DEFINE FIELD institute ON TABLE employee TYPE record<institute>;
DEFINE FIELD role ON TABLE employee TYPE option<string>;
DEFINE FIELD created_at ON TABLE employee TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_employee_user ON TABLE employee COLUMNS user UNIQUE;

-- =======================================================================
-- Students
-- =======================================================================
DEFINE TABLE student SCHEMAFULL;
DEFINE FIELD user ON TABLE student TYPE record<user>;
DEFINE FIELD institute ON TABLE student TYPE record<institute>;
DEFINE FIELD birthday_date ON TABLE student TYPE string;
DEFINE FIELD gender ON TABLE student TYPE string \
    ASSERT $value IN ['CIS_MALE', 'CIS_FEMALE', 'TRANS_MALE', \
    'TRANS_FEMALE', 'NON_BINARY', 'UNSPOKEN'];
DEFINE FIELD disabled_person ON TABLE student TYPE bool DEFAULT false;
DEFINE FIELD address ON TABLE student TYPE object FLEXIBLE;
DEFINE FIELD created_at ON TABLE student TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_student_user ON TABLE student COLUMNS user UNIQUE;

-- =======================================================================
-- Documents (at most one per student)
-- =======================================================================
DEFINE TABLE document SCHEMAFULL;
DEFINE FIELD student ON TABLE document TYPE record<student>;
DEFINE FIELD title ON TABLE document TYPE string;
DEFINE FIELD key ON TABLE document TYPE option<string>;
DEFINE FIELD created_at ON TABLE document TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_document_student ON TABLE document COLUMNS student UNIQUE;
";

/// Run all pending migrations against the given connection.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;
        }
    }

    Ok(())
}
