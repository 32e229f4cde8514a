//! Storage layer for the registry.
//!
//! The whole registry lives in a single `SQLite` file. It is read in full
//! when a command starts and written back in one transaction when the
//! command has changed something.

pub mod migrations;
pub mod schema;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::project::{Project, ProjectId, DATE_FORMAT};
use crate::registry::Registry;

/// Metadata key holding the last issued project identifier.
const LAST_ID_KEY: &str = "last_project_id";

/// Columns read back for every project, in `ProjectRow` order.
const SELECT_PROJECTS: &str = r"
SELECT id, name, owner, email, user_group, collaborators, description,
       status, start_date, end_date, created_at, folder, extra
FROM projects ORDER BY id
";

/// Registry file backed by `SQLite`.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a registry file at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening registry at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        debug!("Registry opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a stored record
    /// cannot be decoded.
    pub fn load(&self) -> Result<Registry> {
        let mut stmt = self.conn.prepare(SELECT_PROJECTS)?;
        let rows = stmt
            .query_map([], ProjectRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let projects = rows
            .into_iter()
            .map(ProjectRow::into_project)
            .collect::<Result<Vec<_>>>()?;

        let last_id = self.last_id()?;
        debug!("Loaded {} projects from {}", projects.len(), self.path.display());
        Registry::from_parts(projects, last_id)
    }

    /// Replace the stored registry with the given one.
    ///
    /// All rows are rewritten inside a single transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save(&mut self, registry: &Registry) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM projects", [])?;
        {
            let mut insert = tx.prepare(
                r"
                INSERT INTO projects (id, name, owner, email, user_group, collaborators,
                    description, status, start_date, end_date, created_at, folder, extra)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ",
            )?;
            for project in registry.iter() {
                let extra = serde_json::to_string(&project.extra)?;
                insert.execute(params![
                    i64::from(project.id.value()),
                    project.name,
                    project.owner,
                    project.email,
                    project.group,
                    project.collaborators,
                    project.description,
                    project.status.as_str(),
                    project.start_date.format(DATE_FORMAT).to_string(),
                    project
                        .end_date
                        .map(|d| d.format(DATE_FORMAT).to_string()),
                    project.created_at.to_rfc3339(),
                    project
                        .folder
                        .as_ref()
                        .map(|f| f.to_string_lossy().into_owned()),
                    extra,
                ])?;
            }
        }

        match registry.last_id() {
            Some(id) => {
                tx.execute(
                    "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
                    (LAST_ID_KEY, id.value().to_string()),
                )?;
            }
            None => {
                tx.execute("DELETE FROM metadata WHERE key = ?1", [LAST_ID_KEY])?;
            }
        }
        tx.commit()?;

        info!(
            "Saved {} projects to {}",
            registry.len(),
            self.path.display()
        );
        Ok(())
    }

    /// The last issued identifier, if any project was ever created.
    fn last_id(&self) -> Result<Option<ProjectId>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                [LAST_ID_KEY],
                |row| row.get(0),
            )
            .optional()?;

        value
            .map(|v| {
                v.parse().map_err(|_| Error::DatabaseMigration {
                    message: format!("invalid {LAST_ID_KEY}: {v}"),
                })
            })
            .transpose()
    }
}

/// A project as stored, before decoding.
#[derive(Debug)]
struct ProjectRow {
    id: i64,
    name: String,
    owner: String,
    email: String,
    group: String,
    collaborators: String,
    description: String,
    status: String,
    start_date: String,
    end_date: Option<String>,
    created_at: String,
    folder: Option<String>,
    extra: String,
}

impl ProjectRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            owner: row.get(2)?,
            email: row.get(3)?,
            group: row.get(4)?,
            collaborators: row.get(5)?,
            description: row.get(6)?,
            status: row.get(7)?,
            start_date: row.get(8)?,
            end_date: row.get(9)?,
            created_at: row.get(10)?,
            folder: row.get(11)?,
            extra: row.get(12)?,
        })
    }

    fn into_project(self) -> Result<Project> {
        let id = u32::try_from(self.id)
            .map(ProjectId::new)
            .map_err(|_| corrupt(self.id, "id", &self.id.to_string()))?;

        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| corrupt(self.id, "created_at", &self.created_at))?;

        let extra: BTreeMap<String, String> = serde_json::from_str(&self.extra)?;

        Ok(Project {
            id,
            status: self
                .status
                .parse()
                .map_err(|_| corrupt(self.id, "status", &self.status))?,
            start_date: decode_date(self.id, "start_date", &self.start_date)?,
            end_date: self
                .end_date
                .as_deref()
                .map(|d| decode_date(self.id, "end_date", d))
                .transpose()?,
            created_at,
            folder: self.folder.map(PathBuf::from),
            name: self.name,
            owner: self.owner,
            email: self.email,
            group: self.group,
            collaborators: self.collaborators,
            description: self.description,
            extra,
        })
    }
}

fn decode_date(id: i64, column: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| corrupt(id, column, value))
}

fn corrupt(id: i64, column: &str, value: &str) -> Error {
    Error::DatabaseMigration {
        message: format!("project {id} has an unreadable {column}: '{value}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{parse_date, NewProject, ProjectStatus, ProjectUpdate};
    use crate::registry::ProjectFilter;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn sample_registry() -> Registry {
        let mut registry = Registry::new();

        let mut alpha = NewProject::new("alpha", "bob");
        alpha.email = "bob@example.com".to_string();
        alpha.group = "Imaging".to_string();
        alpha.description = "Nuclei segmentation".to_string();
        alpha.collaborators = "Jörg Müller".to_string();
        alpha.extra.insert("microscope".to_string(), "SP8".to_string());
        registry.create(alpha).unwrap();

        let id = registry.create(NewProject::new("beta", "jane")).unwrap().id;
        let changes = ProjectUpdate {
            folder: Some(PathBuf::from("2024/5/P_0001")),
            ..ProjectUpdate::default()
        };
        registry.update(id, changes).unwrap();
        let end = registry.get(id).unwrap().start_date;
        registry.close(id, end).unwrap();

        registry
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_load_empty() {
        let storage = create_test_storage();
        let registry = storage.load().unwrap();
        assert!(registry.is_empty());
        assert!(registry.last_id().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let mut storage = create_test_storage();
        let registry = sample_registry();

        storage.save(&registry).unwrap();

        let loaded = storage.load().unwrap();
        let saved: Vec<&Project> = registry.iter().collect();
        let reloaded: Vec<&Project> = loaded.iter().collect();
        assert_eq!(saved, reloaded);
        assert_eq!(loaded.last_id(), registry.last_id());
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let mut storage = create_test_storage();
        let mut registry = sample_registry();
        storage.save(&registry).unwrap();

        let first = registry.iter().next().unwrap().id;
        registry.remove(first).unwrap();
        storage.save(&registry).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(first).unwrap_err().is_not_found());
    }

    #[test]
    fn test_last_id_survives_removal() {
        let mut storage = create_test_storage();
        let mut registry = Registry::new();
        let id = registry.create(NewProject::new("alpha", "bob")).unwrap().id;
        registry.remove(id).unwrap();
        storage.save(&registry).unwrap();

        let mut loaded = storage.load().unwrap();
        let next = loaded.create(NewProject::new("beta", "bob")).unwrap().id;
        assert_eq!(next, ProjectId::new(1));
    }

    #[test]
    fn test_status_filter_after_reload() {
        let mut storage = create_test_storage();
        storage.save(&sample_registry()).unwrap();

        let loaded = storage.load().unwrap();
        let filter = ProjectFilter::all().with_status(ProjectStatus::Completed);
        let names: Vec<&str> = loaded.list(filter).map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["beta"]);
    }

    #[test]
    fn test_corrupt_status_is_reported() {
        let mut storage = create_test_storage();
        storage.save(&sample_registry()).unwrap();
        storage
            .conn
            .execute("UPDATE projects SET status = 'sleeping' WHERE id = 0", [])
            .unwrap();

        let err = storage.load().unwrap_err();
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn test_corrupt_date_is_reported() {
        let mut storage = create_test_storage();
        storage.save(&sample_registry()).unwrap();
        storage
            .conn
            .execute("UPDATE projects SET start_date = '05/01/2024'", [])
            .unwrap();

        let err = storage.load().unwrap_err();
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("sspm.db");

        let mut storage = Storage::open(&db_path).unwrap();
        assert_eq!(storage.path(), db_path);
        storage.save(&sample_registry()).unwrap();
        drop(storage);

        assert!(db_path.exists());
        let reopened = Storage::open(&db_path).unwrap();
        assert_eq!(reopened.load().unwrap().len(), 2);
    }

    #[test]
    fn test_dates_are_stored_as_iso() {
        let mut storage = create_test_storage();
        let mut registry = Registry::new();
        let mut draft = NewProject::new("alpha", "bob");
        draft.start_date = Some(parse_date("2024-02-29").unwrap());
        registry.create(draft).unwrap();
        storage.save(&registry).unwrap();

        let stored: String = storage
            .conn
            .query_row("SELECT start_date FROM projects", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, "2024-02-29");
    }
}
