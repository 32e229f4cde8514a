//! `sspm` - CLI for the Simple Scientific Project Manager
//!
//! This binary provides the command-line interface for registering projects,
//! editing their metadata and creating their folders.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fmt::Display;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing::debug;

use sspm::cli::{
    CloseMode, Cli, Command, ConfigCommand, CreateCommand, ListCommand, ProjectCommand,
    StatsCommand, UpdateCommand,
};
use sspm::config::CONFIG_KEYS;
use sspm::output::{render_details, render_projects, render_stats, OutputFormat};
use sspm::{init_logging, Config, Error, NewProject, ProjectFilter, ProjectUpdate, Workspace};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if std::io::stderr().is_terminal() {
                eprintln!("{} {e:#}", "error:".red().bold());
            } else {
                eprintln!("error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let reporter = Reporter { quiet: cli.quiet };
    let config_path = cli.config.clone().unwrap_or_else(Config::default_config_path);
    debug!("Using configuration file {}", config_path.display());

    match cli.command {
        Command::Version => {
            println!("sspm {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Init { location } => handle_init(&config_path, &location, reporter),
        Command::Config(cmd) => handle_config(&config_path, cmd, reporter),
        Command::Project(cmd) => {
            let workspace = open_workspace(&config_path)?;
            handle_project(workspace, cmd, reporter)
        }
        Command::Stats(StatsCommand::Show { format }) => {
            let workspace = open_workspace(&config_path)?;
            print!("{}", render_stats(&workspace.registry().stats(), format)?);
            Ok(())
        }
    }
}

/// Prints confirmations unless `--quiet` was given.
#[derive(Debug, Clone, Copy)]
struct Reporter {
    quiet: bool,
}

impl Reporter {
    fn success(self, message: impl Display) {
        if self.quiet {
            return;
        }
        if std::io::stdout().is_terminal() {
            println!("{}", message.green());
        } else {
            println!("{message}");
        }
    }
}

fn open_workspace(config_path: &Path) -> anyhow::Result<Workspace> {
    let config = Config::load_from(Some(config_path.to_path_buf()))?;
    Ok(Workspace::open(config)?)
}

fn handle_init(config_path: &Path, location: &Path, reporter: Reporter) -> anyhow::Result<()> {
    let location = if location.is_absolute() {
        location.to_path_buf()
    } else {
        std::env::current_dir()
            .context("cannot resolve the current directory")?
            .join(location)
    };

    let mut config = Config::load_file(config_path)?;
    config.projects.location = Some(location.clone());
    config.validate()?;

    // Opening creates the folder and an empty registry
    let workspace = Workspace::open(config.clone())?;
    config.save_to(config_path)?;

    reporter.success(format!(
        "Initialized projects root {} ({} projects)",
        location.display(),
        workspace.registry().len()
    ));
    Ok(())
}

fn handle_config(config_path: &Path, cmd: ConfigCommand, reporter: Reporter) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(Some(config_path.to_path_buf()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for (key, value) in config.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", config_path.display());
        }
        ConfigCommand::Keys => {
            for key in CONFIG_KEYS {
                println!("{key}");
            }
        }
        ConfigCommand::Get { key } => {
            let config = Config::load_from(Some(config_path.to_path_buf()))?;
            println!("{}", config.get(&key)?);
        }
        ConfigCommand::Set { key, value } => {
            let mut config = Config::load_file(config_path)?;
            config.set(&key, &value)?;
            config.validate()?;
            config.save_to(config_path)?;
            reporter.success(format!("Set {key} = {}", config.get(&key)?));
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(|| config_path.to_path_buf());
            Config::load_from(Some(path.clone()))
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            reporter.success("Configuration is valid.");
        }
    }
    Ok(())
}

fn handle_project(
    mut workspace: Workspace,
    cmd: ProjectCommand,
    reporter: Reporter,
) -> anyhow::Result<()> {
    match cmd {
        ProjectCommand::Create(cmd) => handle_create(&mut workspace, cmd, reporter)?,
        ProjectCommand::List(cmd) => handle_list(&workspace, &cmd)?,
        ProjectCommand::Get { id, key } => {
            println!("{}", workspace.registry().get_field(id, &key)?);
        }
        ProjectCommand::Set { id, key, value } => {
            workspace.registry_mut().set_field(id, &key, &value)?;
            workspace.save()?;
            reporter.success(format!("Set {key} of {id}"));
        }
        ProjectCommand::Update(cmd) => handle_update(&mut workspace, cmd, reporter)?,
        ProjectCommand::Close { id, mode } => {
            let end_date = match mode {
                CloseMode::Now => Local::now().date_naive(),
                CloseMode::Latest => workspace.latest_activity(id)?,
            };
            workspace.registry_mut().close(id, end_date)?;
            workspace.save()?;
            reporter.success(format!("Closed {id} on {end_date}"));
        }
        ProjectCommand::Remove { id } => {
            let project = workspace.registry_mut().remove(id)?;
            workspace.save()?;
            match project.folder {
                Some(folder) => reporter.success(format!(
                    "Removed {id}; its folder {} was kept",
                    workspace.root().join(folder).display()
                )),
                None => reporter.success(format!("Removed {id}")),
            }
        }
        ProjectCommand::Path { id } => {
            println!("{}", workspace.project_folder(id)?.display());
        }
    }
    Ok(())
}

fn handle_create(
    workspace: &mut Workspace,
    cmd: CreateCommand,
    reporter: Reporter,
) -> anyhow::Result<()> {
    let mut draft = NewProject::new(cmd.title, cmd.user_name);
    draft.id = cmd.id;
    draft.email = cmd.user_email;
    draft.group = cmd.user_group;
    draft.description = cmd.short_descr;

    let project = workspace.create_project(draft, !cmd.no_folder)?;
    workspace.save()?;

    let folder: Option<PathBuf> = project.folder.as_ref().map(|f| workspace.root().join(f));
    match folder {
        Some(folder) => reporter.success(format!(
            "Created {} ({}) in {}",
            project.id,
            project.name,
            folder.display()
        )),
        None => reporter.success(format!("Created {} ({})", project.id, project.name)),
    }
    Ok(())
}

fn handle_list(workspace: &Workspace, cmd: &ListCommand) -> anyhow::Result<()> {
    let mut filter = ProjectFilter::all();
    if let Some(id) = cmd.id {
        // A single project that does not exist is an error, not an empty list
        let project = workspace.registry().get(id)?;
        if cmd.format == OutputFormat::Plain {
            print!("{}", render_details(project));
            return Ok(());
        }
        filter = filter.with_id(id);
    }
    if let Some(status) = cmd.status {
        filter = filter.with_status(status);
    }
    if let Some(owner) = &cmd.owner {
        filter = filter.with_owner(owner.as_str());
    }
    if let Some(group) = &cmd.group {
        filter = filter.with_group(group.as_str());
    }
    if cmd.open {
        filter = filter.open_only();
    }
    if let Some(search) = &cmd.search {
        filter = filter.with_search(search.as_str());
    }

    print!("{}", render_projects(workspace.registry().list(filter), cmd.format)?);
    Ok(())
}

fn handle_update(
    workspace: &mut Workspace,
    cmd: UpdateCommand,
    reporter: Reporter,
) -> anyhow::Result<()> {
    let changes = ProjectUpdate {
        name: cmd.title,
        owner: cmd.user_name,
        email: cmd.user_email,
        group: cmd.user_group,
        collaborators: cmd.collaborators,
        description: cmd.short_descr,
        status: cmd.status,
        ..ProjectUpdate::default()
    };
    if changes.is_empty() {
        return Err(Error::invalid_input("nothing to update; pass at least one field option").into());
    }

    let id = cmd.id;
    workspace.registry_mut().update(id, changes)?;
    workspace.save()?;
    reporter.success(format!("Updated {id}"));
    Ok(())
}
