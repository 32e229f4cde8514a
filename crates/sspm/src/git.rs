//! Local git repositories for project folders.
//!
//! New project folders can be put under version control: a `.gitignore` is
//! written, then `git init`, `git add .` and an initial commit are run with
//! the git executable found on the system.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::config::ToolsConfig;
use crate::error::{Error, Result};

/// Message of the first commit in every project repository.
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial import.";

/// Author e-mail used when the project owner has none.
pub const FALLBACK_EMAIL: &str = "sspm@localhost";

/// Patterns ignored in every project repository.
const DEFAULT_IGNORES: &[&str] = &[
    ".ipynb_checkpoints/",
    "__pycache__/",
    ".pytest_cache/",
    ".vscode/",
    ".idea/",
];

/// A git executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Git {
    executable: PathBuf,
}

impl Git {
    /// Use the git executable at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitNotFound`] if the path is not a file.
    pub fn at(executable: impl Into<PathBuf>) -> Result<Self> {
        let executable = executable.into();
        if !executable.is_file() {
            return Err(Error::GitNotFound { path: executable });
        }
        Ok(Self { executable })
    }

    /// Locate git from the tools configuration.
    ///
    /// An explicit `git_path` must exist. Otherwise `PATH` is searched and
    /// `Ok(None)` is returned if git is not installed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitNotFound`] if the configured path does not exist.
    pub fn discover(tools: &ToolsConfig) -> Result<Option<Self>> {
        let git = match &tools.git_path {
            Some(path) => Self::at(path.clone())?,
            None => match find_in_path(env::var_os("PATH").as_deref()) {
                Some(executable) => Self { executable },
                None => return Ok(None),
            },
        };
        debug!("Using git at {}", git.executable().display());
        Ok(Some(git))
    }

    /// Path of the executable.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Turn `folder` into a repository holding its current content.
    ///
    /// The initial commit is authored by `author`, with [`FALLBACK_EMAIL`]
    /// standing in for an empty address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitCommand`] if any git invocation fails, and an I/O
    /// error if `.gitignore` cannot be written.
    pub fn init_repository(
        &self,
        folder: &Path,
        ignore_data: bool,
        author: &str,
        email: &str,
    ) -> Result<()> {
        let email = if email.trim().is_empty() {
            FALLBACK_EMAIL
        } else {
            email.trim()
        };
        let name_setting = format!("user.name={}", author.trim());
        let email_setting = format!("user.email={email}");

        write_gitignore(folder, ignore_data)?;
        self.run(folder, &["init"])?;
        self.run(folder, &["add", "."])?;
        self.run(
            folder,
            &[
                "-c",
                &name_setting,
                "-c",
                &email_setting,
                "commit",
                "-m",
                INITIAL_COMMIT_MESSAGE,
            ],
        )?;
        info!("Initialized git repository in {}", folder.display());
        Ok(())
    }

    fn run(&self, folder: &Path, args: &[&str]) -> Result<()> {
        let command = args.join(" ");
        debug!("Running git {command} in {}", folder.display());

        let output = Command::new(&self.executable)
            .args(args)
            .current_dir(folder)
            .output()
            .map_err(|e| Error::GitCommand {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };
        Err(Error::GitCommand { command, message })
    }
}

/// Contents of the `.gitignore` written into project folders.
#[must_use]
pub fn gitignore_contents(ignore_data: bool) -> String {
    let mut lines = Vec::with_capacity(DEFAULT_IGNORES.len() + 1);
    if ignore_data {
        lines.push("/data/");
    }
    lines.extend_from_slice(DEFAULT_IGNORES);
    let mut contents = lines.join("\n");
    contents.push('\n');
    contents
}

/// Write `.gitignore` into `folder` unless one exists.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_gitignore(folder: &Path, ignore_data: bool) -> Result<()> {
    let path = folder.join(".gitignore");
    if path.exists() {
        debug!("{} already exists", path.display());
        return Ok(());
    }
    fs::write(path, gitignore_contents(ignore_data))?;
    Ok(())
}

fn find_in_path(path_var: Option<&OsStr>) -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    which::which_in("git", path_var, cwd).ok()
}
