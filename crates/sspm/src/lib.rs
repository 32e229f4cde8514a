//! `sspm` - Simple Scientific Project Manager
//!
//! This library keeps a registry of scientific projects in a single `SQLite`
//! file below a projects root, and lays out a standard folder per project,
//! optionally put under git.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod layout;
pub mod logging;
pub mod output;
pub mod project;
pub mod registry;
pub mod storage;
pub mod workspace;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use project::{NewProject, Project, ProjectId, ProjectStatus, ProjectUpdate};
pub use registry::{ProjectFilter, Registry};
pub use storage::Storage;
pub use workspace::Workspace;
