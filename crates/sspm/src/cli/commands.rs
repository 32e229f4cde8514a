//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::output::OutputFormat;
use crate::project::{ProjectId, ProjectStatus};

/// Project management commands.
#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Register a new project and create its folder
    Create(CreateCommand),

    /// List projects
    List(ListCommand),

    /// Print one metadata value of a project
    Get {
        /// Project identifier (e.g. P_0042 or 42)
        #[arg(value_parser = parse_id)]
        id: ProjectId,

        /// Metadata key, e.g. user.email or extra.microscope
        #[arg(default_value = "project.title")]
        key: String,
    },

    /// Change one metadata value of a project
    Set {
        /// Project identifier
        #[arg(value_parser = parse_id)]
        id: ProjectId,

        /// Metadata key
        key: String,

        /// New value; empty clears optional fields
        #[arg(default_value = "")]
        value: String,
    },

    /// Change several fields of a project at once
    Update(UpdateCommand),

    /// Mark a project as completed
    Close {
        /// Project identifier
        #[arg(value_parser = parse_id)]
        id: ProjectId,

        /// Which day to record as end date
        #[arg(value_enum, default_value = "now")]
        mode: CloseMode,
    },

    /// Remove a project from the registry (its folder is kept)
    Remove {
        /// Project identifier
        #[arg(value_parser = parse_id)]
        id: ProjectId,
    },

    /// Print the folder of a project, or the projects root
    Path {
        /// Project identifier
        #[arg(value_parser = parse_id)]
        id: Option<ProjectId>,
    },
}

/// Arguments of `project create`.
#[derive(Debug, Args)]
pub struct CreateCommand {
    /// Project title
    #[arg(short, long)]
    pub title: String,

    /// Name of the responsible person
    #[arg(short = 'n', long)]
    pub user_name: String,

    /// E-mail address of the responsible person
    #[arg(short = 'e', long, default_value = "")]
    pub user_email: String,

    /// Scientific group of the responsible person
    #[arg(short = 'g', long, default_value = "")]
    pub user_group: String,

    /// Short description
    #[arg(short = 'd', long, default_value = "")]
    pub short_descr: String,

    /// Use this identifier instead of the next free one
    #[arg(long, value_parser = parse_id)]
    pub id: Option<ProjectId>,

    /// Register only, without creating a folder
    #[arg(long)]
    pub no_folder: bool,
}

/// Arguments of `project list`.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Show a single project
    #[arg(value_parser = parse_id)]
    pub id: Option<ProjectId>,

    /// Only projects with this status
    #[arg(short, long, value_parser = parse_status)]
    pub status: Option<ProjectStatus>,

    /// Only projects of this owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Only projects of this group
    #[arg(long)]
    pub group: Option<String>,

    /// Only open projects
    #[arg(long)]
    pub open: bool,

    /// Text to look for in title and description
    #[arg(long)]
    pub search: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments of `project update`.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Project identifier
    #[arg(value_parser = parse_id)]
    pub id: ProjectId,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New responsible person
    #[arg(long)]
    pub user_name: Option<String>,

    /// New e-mail address
    #[arg(long)]
    pub user_email: Option<String>,

    /// New group
    #[arg(long)]
    pub user_group: Option<String>,

    /// New description
    #[arg(long)]
    pub short_descr: Option<String>,

    /// New collaborators
    #[arg(long)]
    pub collaborators: Option<String>,

    /// New status
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ProjectStatus>,
}

/// How `project close` picks the end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CloseMode {
    /// Today
    Now,
    /// The last modification inside the project folder
    Latest,
}

/// Statistics commands.
#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Count projects per year and group
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// List the configuration keys
    Keys,

    /// Print one configuration value
    Get {
        /// Dotted key, e.g. projects.location
        key: String,
    },

    /// Change one configuration value and save the file
    Set {
        /// Dotted key
        key: String,

        /// New value; empty clears optional paths
        value: String,
    },

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn parse_id(value: &str) -> Result<ProjectId, String> {
    value.parse().map_err(|e: crate::Error| e.to_string())
}

fn parse_status(value: &str) -> Result<ProjectStatus, String> {
    value.parse().map_err(|e: crate::Error| e.to_string())
}
