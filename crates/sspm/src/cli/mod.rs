//! Command-line interface for sspm.
//!
//! This module provides the CLI structure for the `sspm` binary; the
//! handlers live in `main.rs`.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CloseMode, ConfigCommand, CreateCommand, ListCommand, ProjectCommand, StatsCommand,
    UpdateCommand,
};

use crate::logging::Verbosity;

/// sspm - Simple Scientific Project Manager
///
/// Keeps a registry of scientific projects and creates a standard folder
/// layout, optionally under git, for each of them.
#[derive(Debug, Parser)]
#[command(name = "sspm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the version
    Version,

    /// Set the projects root and create an empty registry there
    Init {
        /// Folder that will hold the registry and all projects
        location: PathBuf,
    },

    /// View or modify configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Show statistics
    #[command(subcommand)]
    Stats(StatsCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use crate::project::{ProjectId, ProjectStatus};
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Version,
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "sspm");
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Debug);
        assert_eq!(cli_with(5, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_init() {
        let cli = Cli::try_parse_from(["sspm", "init", "/srv/projects"]).unwrap();
        match cli.command {
            Command::Init { location } => assert_eq!(location, PathBuf::from("/srv/projects")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "sspm",
            "project",
            "create",
            "--title",
            "alpha",
            "--user-name",
            "bob",
            "--user-group",
            "Lab",
            "--no-folder",
        ])
        .unwrap();
        match cli.command {
            Command::Project(ProjectCommand::Create(cmd)) => {
                assert_eq!(cmd.title, "alpha");
                assert_eq!(cmd.user_name, "bob");
                assert_eq!(cmd.user_group, "Lab");
                assert_eq!(cmd.user_email, "");
                assert!(cmd.id.is_none());
                assert!(cmd.no_folder);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_create_requires_title() {
        let result = Cli::try_parse_from(["sspm", "project", "create", "--user-name", "bob"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = Cli::try_parse_from([
            "sspm", "project", "list", "--status", "on hold", "--open", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Command::Project(ProjectCommand::List(cmd)) => {
                assert_eq!(cmd.status, Some(ProjectStatus::OnHold));
                assert!(cmd.open);
                assert_eq!(cmd.format, OutputFormat::Json);
                assert!(cmd.id.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_get_default_key() {
        let cli = Cli::try_parse_from(["sspm", "project", "get", "P_0007"]).unwrap();
        match cli.command {
            Command::Project(ProjectCommand::Get { id, key }) => {
                assert_eq!(id, ProjectId::new(7));
                assert_eq!(key, "project.title");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_set_default_value() {
        let cli = Cli::try_parse_from(["sspm", "project", "set", "7", "user.email"]).unwrap();
        match cli.command {
            Command::Project(ProjectCommand::Set { value, .. }) => assert_eq!(value, ""),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_close_modes() {
        let cli = Cli::try_parse_from(["sspm", "project", "close", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Project(ProjectCommand::Close {
                mode: CloseMode::Now,
                ..
            })
        ));

        let cli = Cli::try_parse_from(["sspm", "project", "close", "3", "latest"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Project(ProjectCommand::Close {
                mode: CloseMode::Latest,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_invalid_id() {
        let result = Cli::try_parse_from(["sspm", "project", "remove", "X_12"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_set() {
        let cli =
            Cli::try_parse_from(["sspm", "config", "set", "tools.use_git", "false"]).unwrap();
        match cli.command {
            Command::Config(ConfigCommand::Set { key, value }) => {
                assert_eq!(key, "tools.use_git");
                assert_eq!(value, "false");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_stats() {
        let cli = Cli::try_parse_from(["sspm", "stats", "show", "-f", "table"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Stats(StatsCommand::Show {
                format: OutputFormat::Table
            })
        ));
    }

    #[test]
    fn test_parse_with_global_flags() {
        let cli = Cli::try_parse_from(["sspm", "-c", "/custom/sspm.toml", "-vv", "version"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/sspm.toml")));
        assert_eq!(cli.verbose, 2);
    }
}
