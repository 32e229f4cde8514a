//! Schema versioning of the registry file.
//!
//! The version lives in the `user_version` pragma of `SQLite`. Each migration is a
//! list of statements applied in one transaction together with the version
//! bump, so a registry is never left half-migrated.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// One step of the schema history.
#[derive(Debug)]
struct Migration {
    version: i32,
    description: &'static str,
    statements: &'static [&'static str],
}

/// Schema history, oldest first.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "projects and metadata tables",
    statements: SCHEMA_STATEMENTS,
}];

/// Schema version written by this release.
pub const CURRENT_VERSION: i32 = 1;

/// Bring a registry file up to [`CURRENT_VERSION`].
///
/// Fresh files get the whole history applied.
///
/// # Errors
///
/// Returns [`Error::DatabaseMigration`] if the file was written by a newer
/// release, and a database error if a migration fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "registry schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > version) {
        apply(conn, migration)?;
    }
    Ok(())
}

/// Version stored in the file; 0 for a new file.
///
/// # Errors
///
/// Returns a database error if the pragma cannot be read.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    debug!(
        "Applying registry migration {} ({})",
        migration.version, migration.description
    );

    let tx = conn.unchecked_transaction()?;
    for statement in migration.statements {
        tx.execute_batch(statement)?;
    }
    tx.pragma_update(None, "user_version", migration.version)?;
    tx.commit()?;

    info!("Registry schema is now at version {}", migration.version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_history_ends_at_current_version() {
        let last = MIGRATIONS.last().map(|m| m.version);
        assert_eq!(last, Some(CURRENT_VERSION));
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version + 1 == w[1].version));
    }

    #[test]
    fn test_fresh_file_gets_all_tables() {
        let conn = memory();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        initialize_schema(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
        assert_eq!(names(&conn, "table"), vec!["metadata", "projects"]);

        let indexes = names(&conn, "index");
        assert!(indexes.iter().any(|n| n == "idx_projects_status"));
        assert!(indexes.iter().any(|n| n == "idx_projects_owner"));
    }

    #[test]
    fn test_reopening_is_a_no_op() {
        let conn = memory();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('last_project_id', '4')",
            [],
        )
        .unwrap();

        initialize_schema(&conn).unwrap();
        let kept: String = conn
            .query_row("SELECT value FROM metadata WHERE key = 'last_project_id'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(kept, "4");
    }

    #[test]
    fn test_newer_file_is_rejected() {
        let conn = memory();
        conn.pragma_update(None, "user_version", CURRENT_VERSION + 1)
            .unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(matches!(err, Error::DatabaseMigration { .. }));
        assert!(err.to_string().contains("newer than supported"));
        assert!(names(&conn, "table").is_empty());
    }
}
