//! On-disk layout of project folders.
//!
//! Every project gets a folder `<root>/<YEAR>/<MONTH>/<P_XXXX>/` with a fixed
//! set of sub-folders and a human-readable `metadata/info.md`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, NaiveDate};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::project::{Project, ProjectId};

/// Sub-folders created inside every project folder.
pub const SUBFOLDERS: &[&str] = &[
    "metadata",
    "data",
    "results",
    "references",
    "code/extern",
    "code/matlab",
    "code/python",
    "code/macros",
    "code/notebooks",
    "code/ilastik",
];

/// Name of the human-readable metadata summary.
const INFO_FILE: &str = "metadata/info.md";

/// Location of one project folder below the projects root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    relative: PathBuf,
}

impl ProjectLayout {
    /// Compute the folder of a project started on `date`.
    #[must_use]
    pub fn for_project(root: impl Into<PathBuf>, id: ProjectId, date: NaiveDate) -> Self {
        let relative = PathBuf::from(date.year().to_string())
            .join(date.month().to_string())
            .join(id.to_string());
        Self {
            root: root.into(),
            relative,
        }
    }

    /// Wrap an already known folder, relative to the projects root.
    #[must_use]
    pub fn from_relative(root: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            relative: relative.into(),
        }
    }

    /// Folder path relative to the projects root, as stored in the registry.
    #[must_use]
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Absolute folder path.
    #[must_use]
    pub fn full_path(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    /// Whether the folder exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.full_path().is_dir()
    }

    /// Create the folder skeleton and the metadata summary for a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the folder already exists, and an
    /// I/O error if anything cannot be created.
    pub fn create(&self, project: &Project) -> Result<PathBuf> {
        let full = self.full_path();
        if self.exists() {
            return Err(Error::invalid_input(format!(
                "the project folder {} already exists",
                full.display()
            )));
        }

        for sub in SUBFOLDERS {
            let path = full.join(sub);
            fs::create_dir_all(&path).map_err(|source| Error::DirectoryCreate {
                path: path.clone(),
                source,
            })?;
        }
        debug!("Created folder skeleton in {}", full.display());

        self.write_info(project)?;

        info!("Created project folder {}", full.display());
        Ok(full)
    }

    /// Write `metadata/info.md` unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn write_info(&self, project: &Project) -> Result<()> {
        let path = self.full_path().join(INFO_FILE);
        if path.exists() {
            warn!("{} already exists, leaving it untouched", path.display());
            return Ok(());
        }
        fs::write(&path, render_info(project))?;
        Ok(())
    }
}

/// Markdown summary of a project, as written to `metadata/info.md`.
#[must_use]
pub fn render_info(project: &Project) -> String {
    let mut out = String::new();
    let end = project
        .end_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default();

    // Writing into a String cannot fail
    let _ = writeln!(out, "# {}", project.name);
    let _ = writeln!(out, "**ID**: {}", project.id);
    let _ = writeln!(out, "**Start date**: {}", project.start_date.format("%d/%m/%Y"));
    let _ = writeln!(out, "**End date**: {end}");
    let _ = writeln!(out, "**Status**: {}", project.status);
    let _ = writeln!(out, "## User information");
    let _ = writeln!(out, "**Name**: {}", project.owner);
    let _ = writeln!(out, "**E-mail**: {}", project.email);
    let _ = writeln!(out, "**Group**: {}", project.group);
    let _ = writeln!(out, "**Collaborators**: {}", project.collaborators);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Description");
    let _ = writeln!(out, "{}", project.description);
    out
}

/// Local date of the most recently modified entry below `path`.
///
/// Returns `None` if the folder is empty or missing. The `.git` folder is
/// skipped, so repository housekeeping does not count as project work.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be read.
pub fn latest_modification(path: &Path) -> Result<Option<NaiveDate>> {
    if !path.is_dir() {
        return Ok(None);
    }

    let mut latest = None;
    let walker = WalkDir::new(path)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in walker {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let modified = entry.metadata().map_err(|e| Error::Io(e.into()))?.modified()?;
        latest = latest.max(Some(modified));
    }

    Ok(latest.map(|time| DateTime::<Local>::from(time).date_naive()))
}
