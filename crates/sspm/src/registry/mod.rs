//! The project registry.
//!
//! The registry holds every project record in memory, ordered by identifier.
//! It is loaded from [`Storage`](crate::storage::Storage) at startup, mutated
//! by the CLI, and flushed back when it has changes.

mod filter;
mod stats;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::project::{NewProject, Project, ProjectId, ProjectStatus, ProjectUpdate};

pub use filter::ProjectFilter;
pub use stats::{count_by_year_and_group, GroupCount};

/// In-memory collection of project records.
///
/// Identifiers are unique and records are kept sorted by identifier. The
/// registry remembers the last identifier it ever issued, so identifiers of
/// removed projects are never handed out again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    projects: Vec<Project>,
    last_id: Option<ProjectId>,
    dirty: bool,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateIdentifier`] if two records share an id.
    pub fn from_parts(mut projects: Vec<Project>, last_id: Option<ProjectId>) -> Result<Self> {
        projects.sort_by_key(|p| p.id);
        if let Some(pair) = projects.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(Error::duplicate(pair[0].id));
        }
        Ok(Self {
            projects,
            last_id,
            dirty: false,
        })
    }

    /// Number of projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the registry holds no projects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// The last identifier ever issued.
    #[must_use]
    pub fn last_id(&self) -> Option<ProjectId> {
        self.last_id
    }

    /// Whether the registry changed since it was loaded or last saved.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the registry as persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// All projects, in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Project> + '_ {
        self.projects.iter()
    }

    /// The identifier the next auto-numbered project will get.
    ///
    /// # Errors
    ///
    /// Returns an error once the identifier range is exhausted.
    pub fn next_id(&self) -> Result<ProjectId> {
        let highest = self.projects.last().map(|p| p.id).max(self.last_id);
        match highest {
            Some(id) => id.next(),
            None => Ok(ProjectId::new(0)),
        }
    }

    /// Add a new project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateIdentifier`] if the draft carries an
    /// identifier already in use, or [`Error::InvalidInput`] if a field is
    /// malformed.
    pub fn create(&mut self, draft: NewProject) -> Result<&Project> {
        let id = match draft.id {
            Some(id) => {
                if self.position(id).is_ok() {
                    return Err(Error::duplicate(id));
                }
                id
            }
            None => self.next_id()?,
        };

        let project = draft.into_project(id, Utc::now());
        project.validate()?;

        let index = match self.position(id) {
            Ok(_) => return Err(Error::duplicate(id)),
            Err(index) => index,
        };
        self.projects.insert(index, project);
        self.last_id = self.last_id.max(Some(id));
        self.dirty = true;

        info!("Created project {}", id);
        Ok(&self.projects[index])
    }

    /// Iterate lazily over the projects matching a filter.
    pub fn list(&self, filter: ProjectFilter) -> impl Iterator<Item = &Project> + '_ {
        self.projects.iter().filter(move |p| filter.matches(p))
    }

    /// Look up a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no project has this identifier.
    pub fn get(&self, id: ProjectId) -> Result<&Project> {
        let index = self.position(id).map_err(|_| Error::not_found(id))?;
        Ok(&self.projects[index])
    }

    /// Apply field changes to a project.
    ///
    /// The project is left untouched if the result would be invalid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no project has this identifier, or
    /// [`Error::InvalidInput`] if the changes are malformed.
    pub fn update(&mut self, id: ProjectId, changes: ProjectUpdate) -> Result<&Project> {
        let index = self.position(id).map_err(|_| Error::not_found(id))?;

        let mut updated = self.projects[index].clone();
        changes.apply_to(&mut updated);
        updated.validate()?;

        if updated != self.projects[index] {
            self.projects[index] = updated;
            self.dirty = true;
            debug!("Updated project {}", id);
        }
        Ok(&self.projects[index])
    }

    /// Delete a project record and return it.
    ///
    /// The project folder on disk is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no project has this identifier.
    pub fn remove(&mut self, id: ProjectId) -> Result<Project> {
        let index = self.position(id).map_err(|_| Error::not_found(id))?;
        let project = self.projects.remove(index);
        self.dirty = true;
        info!("Removed project {}", id);
        Ok(project)
    }

    /// Read a metadata value of a project by dotted key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown projects and
    /// [`Error::InvalidInput`] for unknown keys.
    pub fn get_field(&self, id: ProjectId, key: &str) -> Result<String> {
        self.get(id)?.get_field(key)
    }

    /// Change a metadata value of a project by dotted key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown projects and
    /// [`Error::InvalidInput`] for unknown keys or rejected values.
    pub fn set_field(&mut self, id: ProjectId, key: &str, value: &str) -> Result<()> {
        let index = self.position(id).map_err(|_| Error::not_found(id))?;
        let project = &mut self.projects[index];
        let before = project.clone();
        project.set_field(key, value)?;
        if *project != before {
            self.dirty = true;
            debug!("Set {} of project {}", key, id);
        }
        Ok(())
    }

    /// Mark a project as completed on the given day.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown projects and
    /// [`Error::InvalidInput`] if the day precedes the start date.
    pub fn close(&mut self, id: ProjectId, end_date: NaiveDate) -> Result<&Project> {
        let changes = ProjectUpdate {
            status: Some(ProjectStatus::Completed),
            end_date: Some(Some(end_date)),
            ..ProjectUpdate::default()
        };
        let project = self.update(id, changes)?;
        info!("Closed project {} on {}", id, end_date);
        Ok(project)
    }

    /// Project counts per start year and group.
    #[must_use]
    pub fn stats(&self) -> Vec<GroupCount> {
        count_by_year_and_group(&self.projects)
    }

    fn position(&self, id: ProjectId) -> std::result::Result<usize, usize> {
        self.projects.binary_search_by_key(&id, |p| p.id)
    }
}
