//! Core project record types for sspm.
//!
//! This module defines the project identifier, the status vocabulary, and
//! the record kept for every project in the registry, together with the
//! input types used to create and change records.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix of the canonical identifier form.
const ID_PREFIX: &str = "P_";

/// Prefix of free-text metadata keys.
pub const EXTRA_KEY_PREFIX: &str = "extra.";

/// Metadata keys addressable through [`Project::get_field`] and
/// [`Project::set_field`], besides `extra.<name>`.
pub const METADATA_KEYS: &[&str] = &[
    "project.title",
    "project.start_date",
    "project.end_date",
    "project.status",
    "project.description",
    "user.name",
    "user.email",
    "user.group",
    "user.collaborators",
];

/// Metadata keys that can never hold an empty value.
const REQUIRED_KEYS: &[&str] = &[
    "project.title",
    "project.start_date",
    "project.status",
    "user.name",
];

/// Date format used for start and end dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Unique identifier of a project, rendered as `P_0042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ProjectId(u32);

impl ProjectId {
    /// Wrap a raw numeric identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The numeric part of the identifier.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// The identifier following this one.
    ///
    /// # Errors
    ///
    /// Returns an error once the numeric range is exhausted.
    pub fn next(self) -> Result<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or_else(|| Error::invalid_input("project identifiers exhausted"))
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ID_PREFIX}{:04}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = match trimmed.get(..ID_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(ID_PREFIX) => &trimmed[ID_PREFIX.len()..],
            _ => trimmed,
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_input(format!(
                "'{s}' is not a valid project id (expected e.g. P_0042 or 42)"
            )));
        }

        digits
            .parse()
            .map(Self)
            .map_err(|_| Error::invalid_input(format!("project id '{s}' is out of range")))
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ProjectId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Where a project stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ProjectStatus {
    /// Freshly created.
    #[default]
    New,
    /// Waiting on feedback from collaborators.
    Feedback,
    /// Actively worked on.
    InProgress,
    /// Blocked until data arrives.
    WaitingForData,
    /// Paused.
    OnHold,
    /// Replaced by another project.
    Superseded,
    /// Abandoned.
    Dropped,
    /// Finished.
    Completed,
    /// Finished and put away.
    Archived,
}

impl ProjectStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::New,
        Self::Feedback,
        Self::InProgress,
        Self::WaitingForData,
        Self::OnHold,
        Self::Superseded,
        Self::Dropped,
        Self::Completed,
        Self::Archived,
    ];

    /// The canonical lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Feedback => "feedback",
            Self::InProgress => "in progress",
            Self::WaitingForData => "waiting for data",
            Self::OnHold => "on hold",
            Self::Superseded => "superseded",
            Self::Dropped => "dropped",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Whether work on the project is still expected.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::New | Self::Feedback | Self::InProgress | Self::WaitingForData | Self::OnHold
        )
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                Error::invalid_input(format!(
                    "unknown status '{s}'; valid values are: {}",
                    valid.join(", ")
                ))
            })
    }
}

impl From<ProjectStatus> for String {
    fn from(status: ProjectStatus) -> Self {
        status.as_str().to_string()
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A project record as kept in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier.
    pub id: ProjectId,
    /// Project title.
    pub name: String,
    /// Responsible person.
    pub owner: String,
    /// Owner's e-mail address (may be empty).
    pub email: String,
    /// Owner's scientific group (may be empty).
    pub group: String,
    /// Free-text list of collaborators.
    pub collaborators: String,
    /// Short description.
    pub description: String,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Day the project started.
    pub start_date: NaiveDate,
    /// Day the project ended, once closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Project folder relative to the projects root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<PathBuf>,
    /// Free-text metadata fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Project {
    /// Check the record's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("project name must not be empty"));
        }
        if self.owner.trim().is_empty() {
            return Err(Error::invalid_input("project owner must not be empty"));
        }
        validate_email(&self.email)?;
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(Error::invalid_input(format!(
                    "end date {end} is before start date {}",
                    self.start_date
                )));
            }
        }
        for key in self.extra.keys() {
            validate_extra_name(key)?;
        }
        Ok(())
    }

    /// Read a metadata value by dotted key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown keys.
    pub fn get_field(&self, key: &str) -> Result<String> {
        let value = match key {
            "project.title" => self.name.clone(),
            "project.start_date" => self.start_date.format(DATE_FORMAT).to_string(),
            "project.end_date" => self
                .end_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            "project.status" => self.status.to_string(),
            "project.description" => self.description.clone(),
            "user.name" => self.owner.clone(),
            "user.email" => self.email.clone(),
            "user.group" => self.group.clone(),
            "user.collaborators" => self.collaborators.clone(),
            _ => match key.strip_prefix(EXTRA_KEY_PREFIX) {
                Some(name) => {
                    validate_extra_name(name)?;
                    self.extra.get(name).cloned().unwrap_or_default()
                }
                None => return Err(unknown_metadata_key(key)),
            },
        };
        Ok(value)
    }

    /// Change a metadata value by dotted key.
    ///
    /// The record is left untouched when the new value is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown keys, for empty values of
    /// required keys, and for values that do not parse.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() && REQUIRED_KEYS.contains(&key) {
            return Err(Error::invalid_input(format!(
                "metadata key {key} can not be set to empty"
            )));
        }

        let mut updated = self.clone();
        match key {
            "project.title" => updated.name = value.trim().to_string(),
            "project.start_date" => updated.start_date = parse_date(value)?,
            "project.end_date" => {
                updated.end_date = if value.trim().is_empty() {
                    None
                } else {
                    Some(parse_date(value)?)
                }
            }
            "project.status" => updated.status = value.parse()?,
            "project.description" => updated.description = value.to_string(),
            "user.name" => updated.owner = value.trim().to_string(),
            "user.email" => updated.email = value.trim().to_string(),
            "user.group" => updated.group = value.to_string(),
            "user.collaborators" => updated.collaborators = value.to_string(),
            _ => match key.strip_prefix(EXTRA_KEY_PREFIX) {
                Some(name) => {
                    validate_extra_name(name)?;
                    if value.is_empty() {
                        updated.extra.remove(name);
                    } else {
                        updated.extra.insert(name.to_string(), value.to_string());
                    }
                }
                None => return Err(unknown_metadata_key(key)),
            },
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Whether work on the project is still expected.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

/// Input for creating a new project.
///
/// Only `name` and `owner` are required; everything else has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    /// Explicit identifier; auto-generated when `None`.
    pub id: Option<ProjectId>,
    /// Project title.
    pub name: String,
    /// Responsible person.
    pub owner: String,
    /// Owner's e-mail address.
    pub email: String,
    /// Owner's scientific group.
    pub group: String,
    /// Free-text list of collaborators.
    pub collaborators: String,
    /// Short description.
    pub description: String,
    /// Initial status (defaults to `new`).
    pub status: Option<ProjectStatus>,
    /// Start date (defaults to the creation day).
    pub start_date: Option<NaiveDate>,
    /// Free-text metadata fields.
    pub extra: BTreeMap<String, String>,
}

impl NewProject {
    /// Start a draft with the two required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// Turn the draft into a record with the given identifier.
    #[must_use]
    pub(crate) fn into_project(self, id: ProjectId, created_at: DateTime<Utc>) -> Project {
        Project {
            id,
            name: self.name.trim().to_string(),
            owner: self.owner.trim().to_string(),
            email: self.email.trim().to_string(),
            group: self.group,
            collaborators: self.collaborators,
            description: self.description,
            status: self.status.unwrap_or_default(),
            start_date: self
                .start_date
                .unwrap_or_else(|| created_at.with_timezone(&chrono::Local).date_naive()),
            end_date: None,
            created_at,
            folder: None,
            extra: self.extra,
        }
    }
}

/// A set of field changes; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    /// New title.
    pub name: Option<String>,
    /// New owner.
    pub owner: Option<String>,
    /// New e-mail address.
    pub email: Option<String>,
    /// New group.
    pub group: Option<String>,
    /// New collaborators.
    pub collaborators: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New status.
    pub status: Option<ProjectStatus>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date; `Some(None)` clears it.
    pub end_date: Option<Option<NaiveDate>>,
    /// New project folder.
    pub folder: Option<PathBuf>,
}

impl ProjectUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the changes to a record.
    pub(crate) fn apply_to(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name.trim().to_string();
        }
        if let Some(owner) = self.owner {
            project.owner = owner.trim().to_string();
        }
        if let Some(email) = self.email {
            project.email = email.trim().to_string();
        }
        if let Some(group) = self.group {
            project.group = group;
        }
        if let Some(collaborators) = self.collaborators {
            project.collaborators = collaborators;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
        if let Some(folder) = self.folder {
            project.folder = Some(folder);
        }
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the value is not a valid date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        Error::invalid_input(format!("'{value}' is not a valid date (expected YYYY-MM-DD)"))
    })
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid e-mail regex"))
}

/// Check an e-mail address; the empty string is accepted.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a non-empty address is malformed.
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() || email_regex().is_match(email) {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "'{email}' is not a valid e-mail address"
        )))
    }
}

fn validate_extra_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "'{name}' is not a valid metadata field name"
        )))
    }
}

fn unknown_metadata_key(key: &str) -> Error {
    Error::invalid_input(format!(
        "the metadata key '{key}' is not recognized; valid keys are {}, {EXTRA_KEY_PREFIX}<name>",
        METADATA_KEYS.join(", ")
    ))
}
