//! Rendering of projects and statistics for the terminal.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::Result;
use crate::project::{Project, DATE_FORMAT};
use crate::registry::GroupCount;

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One line per entry
    #[default]
    Plain,
    /// Aligned table with a header
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Render a list of projects.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_projects<'a>(
    projects: impl IntoIterator<Item = &'a Project>,
    format: OutputFormat,
) -> Result<String> {
    let projects: Vec<&Project> = projects.into_iter().collect();
    match format {
        OutputFormat::Json => to_json(&projects),
        OutputFormat::Plain => {
            let mut out = String::new();
            for project in &projects {
                let _ = writeln!(
                    out,
                    "{}  {}  [{}]  {}",
                    project.id, project.name, project.status, project.owner
                );
            }
            Ok(out)
        }
        OutputFormat::Table => {
            let rows = projects
                .iter()
                .map(|p| {
                    vec![
                        p.id.to_string(),
                        p.name.clone(),
                        p.owner.clone(),
                        p.group.clone(),
                        p.status.to_string(),
                        p.start_date.format(DATE_FORMAT).to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            Ok(render_table(
                &["ID", "Title", "Owner", "Group", "Status", "Start"],
                &rows,
            ))
        }
    }
}

/// Render project counts per year and group.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_stats(stats: &[GroupCount], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(stats),
        OutputFormat::Plain => {
            let mut out = String::new();
            for entry in stats {
                let _ = writeln!(
                    out,
                    "{}  {}  {}",
                    entry.year,
                    display_group(&entry.group),
                    entry.projects
                );
            }
            Ok(out)
        }
        OutputFormat::Table => {
            let rows = stats
                .iter()
                .map(|entry| {
                    vec![
                        entry.year.to_string(),
                        display_group(&entry.group).to_string(),
                        entry.projects.to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            Ok(render_table(&["Year", "Group", "Projects"], &rows))
        }
    }
}

/// Render a single project as `key: value` lines using the metadata keys.
#[must_use]
pub fn render_details(project: &Project) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id: {}", project.id);
    for key in crate::project::METADATA_KEYS {
        let value = project.get_field(key).unwrap_or_default();
        let _ = writeln!(out, "{key}: {value}");
    }
    for (name, value) in &project.extra {
        let _ = writeln!(out, "{}{name}: {value}", crate::project::EXTRA_KEY_PREFIX);
    }
    if let Some(folder) = &project.folder {
        let _ = writeln!(out, "folder: {}", folder.display());
    }
    out
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

fn display_group(group: &str) -> &str {
    if group.is_empty() {
        "-"
    } else {
        group
    }
}

/// Lay out rows as a bordered table with left-aligned columns.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator = {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    let _ = writeln!(out, "{separator}");
    let _ = writeln!(out, "{}", format_row(headers.iter().copied(), &widths));
    let _ = writeln!(out, "{separator}");
    for row in rows {
        let _ = writeln!(out, "{}", format_row(row.iter().map(String::as_str), &widths));
    }
    let _ = writeln!(out, "{separator}");
    out
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.zip(widths) {
        let padding = width - cell.chars().count();
        let _ = write!(line, " {cell}{} |", " ".repeat(padding));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{parse_date, NewProject, ProjectId};
    use crate::registry::count_by_year_and_group;
    use chrono::Utc;

    fn project(id: u32, name: &str, owner: &str, group: &str) -> Project {
        let mut draft = NewProject::new(name, owner);
        draft.group = group.to_string();
        draft.start_date = Some(parse_date("2024-03-01").unwrap());
        draft.into_project(ProjectId::new(id), Utc::now())
    }

    #[test]
    fn test_plain_listing() {
        let projects = [project(1, "alpha", "bob", ""), project(2, "beta", "eve", "")];
        let out = render_projects(&projects, OutputFormat::Plain).unwrap();
        assert_eq!(out, "P_0001  alpha  [new]  bob\nP_0002  beta  [new]  eve\n");
    }

    #[test]
    fn test_table_listing_aligns_columns() {
        let projects = [
            project(1, "alpha", "Jörg Müller", "Lab"),
            project(12, "a much longer title", "bob", ""),
        ];
        let out = render_projects(&projects, OutputFormat::Table).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 6);
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width));
        assert!(lines[1].contains("| ID "));
        assert!(lines[3].contains("Jörg Müller"));
    }

    #[test]
    fn test_empty_table_has_header() {
        let out = render_projects(std::iter::empty(), OutputFormat::Table).unwrap();
        assert!(out.contains("Title"));
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn test_json_listing() {
        let projects = [project(1, "alpha", "bob", "")];
        let out = render_projects(&projects, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["id"], "P_0001");
        assert_eq!(parsed[0]["name"], "alpha");
        assert_eq!(parsed[0]["status"], "new");
    }

    #[test]
    fn test_stats_plain() {
        let projects = [
            project(1, "alpha", "bob", "Lab"),
            project(2, "beta", "bob", "Lab"),
            project(3, "gamma", "bob", ""),
        ];
        let stats = count_by_year_and_group(&projects);
        let out = render_stats(&stats, OutputFormat::Plain).unwrap();
        assert_eq!(out, "2024  -  1\n2024  Lab  2\n");
    }

    #[test]
    fn test_details() {
        let mut p = project(7, "alpha", "bob", "Lab");
        p.extra.insert("microscope".to_string(), "LSM 880".to_string());
        let out = render_details(&p);
        assert!(out.starts_with("id: P_0007\n"));
        assert!(out.contains("project.title: alpha\n"));
        assert!(out.contains("user.group: Lab\n"));
        assert!(out.contains("extra.microscope: LSM 880\n"));
    }
}
