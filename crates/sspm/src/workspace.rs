//! A configured projects root: registry, folders and git in one place.
//!
//! [`Workspace::open`] loads the registry from the file configured for the
//! projects root, commands work on the in-memory [`Registry`], and
//! [`Workspace::save`] writes it back when something changed.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::Git;
use crate::layout::{latest_modification, ProjectLayout};
use crate::project::{NewProject, Project, ProjectId, ProjectUpdate};
use crate::registry::Registry;
use crate::storage::Storage;

/// An opened projects root.
#[derive(Debug)]
pub struct Workspace {
    config: Config,
    root: PathBuf,
    storage: Storage,
    registry: Registry,
}

impl Workspace {
    /// Open the projects root named by the configuration.
    ///
    /// Creates the root folder and the registry file when missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] if no projects location is set, and
    /// an I/O or database error if the registry cannot be opened.
    pub fn open(config: Config) -> Result<Self> {
        let root = config.projects_location()?.to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|source| Error::DirectoryCreate {
                path: root.clone(),
                source,
            })?;
            info!("Created projects root {}", root.display());
        }

        let storage = Storage::open(config.database_path()?)?;
        let registry = storage.load()?;
        debug!("Workspace opened with {} projects", registry.len());

        Ok(Self {
            config,
            root,
            storage,
            registry,
        })
    }

    /// The projects root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configuration the workspace was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access to the registry.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Write the registry back if it changed. Returns whether it was written.
    ///
    /// # Errors
    ///
    /// Returns a database error if the write fails.
    pub fn save(&mut self) -> Result<bool> {
        if !self.registry.is_dirty() {
            return Ok(false);
        }
        self.storage.save(&self.registry)?;
        self.registry.mark_clean();
        Ok(true)
    }

    /// Register a project and, when enabled, create its folder and repository.
    ///
    /// The record is saved before git runs, so a failing git step leaves
    /// both the record and the folder in place.
    ///
    /// # Errors
    ///
    /// Returns the registry error for invalid or duplicate input,
    /// [`Error::InvalidInput`] if the folder already exists, and git errors
    /// from the repository setup. When the folder cannot be created the
    /// record is dropped, but its identifier stays used so the next attempt
    /// gets a fresh one.
    pub fn create_project(&mut self, draft: NewProject, with_folder: bool) -> Result<Project> {
        let project = self.registry.create(draft)?.clone();
        if !(with_folder && self.config.projects.create_folders) {
            return Ok(project);
        }

        let layout = ProjectLayout::for_project(&self.root, project.id, project.start_date);
        if let Err(e) = layout.create(&project) {
            self.registry.remove(project.id)?;
            self.save()?;
            return Err(e);
        }

        let changes = ProjectUpdate {
            folder: Some(layout.relative().to_path_buf()),
            ..ProjectUpdate::default()
        };
        let project = self.registry.update(project.id, changes)?.clone();
        self.save()?;

        if self.config.tools.use_git {
            match Git::discover(&self.config.tools)? {
                Some(git) => git.init_repository(
                    &layout.full_path(),
                    self.config.tools.git_ignore_data,
                    &project.owner,
                    &project.email,
                )?,
                None => warn!("git not found, {} is not under version control", project.id),
            }
        }

        Ok(project)
    }

    /// Absolute folder of a project, or the projects root for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown projects and
    /// [`Error::InvalidInput`] if the project has no folder.
    pub fn project_folder(&self, id: Option<ProjectId>) -> Result<PathBuf> {
        let Some(id) = id else {
            return Ok(self.root.clone());
        };
        let project = self.registry.get(id)?;
        project
            .folder
            .as_ref()
            .map(|folder| self.root.join(folder))
            .ok_or_else(|| Error::invalid_input(format!("project {id} has no folder")))
    }

    /// Date of the most recent change inside a project's folder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the project has no folder or the
    /// folder holds no files.
    pub fn latest_activity(&self, id: ProjectId) -> Result<NaiveDate> {
        let folder = self.project_folder(Some(id))?;
        latest_modification(&folder)?.ok_or_else(|| {
            Error::invalid_input(format!(
                "no files found in {} to take the end date from",
                folder.display()
            ))
        })
    }
}
