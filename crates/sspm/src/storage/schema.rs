//! `SQLite` schema definitions for the registry.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the projects table.
pub const CREATE_PROJECTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    owner TEXT NOT NULL,
    email TEXT NOT NULL DEFAULT '',
    user_group TEXT NOT NULL DEFAULT '',
    collaborators TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT,
    created_at TEXT NOT NULL,
    folder TEXT,
    extra TEXT NOT NULL DEFAULT '{}'
)
";

/// SQL statement to create an index on status for filtering.
pub const CREATE_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status)
";

/// SQL statement to create an index on owner for filtering.
pub const CREATE_OWNER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_PROJECTS_TABLE,
    CREATE_STATUS_INDEX,
    CREATE_OWNER_INDEX,
    CREATE_METADATA_TABLE,
];
