//! Record selection for registry listings.

use crate::project::{Project, ProjectId, ProjectStatus};

/// Criteria a project must meet to be listed.
///
/// The default filter matches every project. All criteria that are set must
/// hold at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Exact identifier.
    pub id: Option<ProjectId>,
    /// Exact status.
    pub status: Option<ProjectStatus>,
    /// Owner, compared case-insensitively.
    pub owner: Option<String>,
    /// Group, compared case-insensitively.
    pub group: Option<String>,
    /// Only projects whose status is open.
    pub open_only: bool,
    /// Case-insensitive substring of the name or description.
    pub search: Option<String>,
}

impl ProjectFilter {
    /// A filter that matches every project.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to a single identifier.
    #[must_use]
    pub fn with_id(mut self, id: ProjectId) -> Self {
        self.id = Some(id);
        self
    }

    /// Restrict to a status.
    #[must_use]
    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to an owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Restrict to a group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Restrict to open projects.
    #[must_use]
    pub fn open_only(mut self) -> Self {
        self.open_only = true;
        self
    }

    /// Restrict to projects mentioning the given text.
    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    /// Check whether a project satisfies every criterion.
    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        if self.id.is_some_and(|id| id != project.id) {
            return false;
        }
        if self.status.is_some_and(|status| status != project.status) {
            return false;
        }
        if self.open_only && !project.is_open() {
            return false;
        }
        if let Some(owner) = &self.owner {
            if !same_text(&project.owner, owner) {
                return false;
            }
        }
        if let Some(group) = &self.group {
            if !same_text(&project.group, group) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !project.name.to_lowercase().contains(&needle)
                && !project.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
