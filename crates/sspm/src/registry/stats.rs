//! Project counts per year and group.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::project::Project;

/// Number of projects started in one year by one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    /// Start year.
    pub year: i32,
    /// Owner's group (empty when unknown).
    pub group: String,
    /// Number of projects.
    pub projects: usize,
}

/// Count projects by start year and group.
///
/// Rows are sorted by year, most recent first, then by group name.
pub fn count_by_year_and_group<'a>(projects: impl IntoIterator<Item = &'a Project>) -> Vec<GroupCount> {
    let mut counts: BTreeMap<(i32, &str), usize> = BTreeMap::new();
    for project in projects {
        *counts
            .entry((project.start_date.year(), project.group.as_str()))
            .or_default() += 1;
    }

    let mut rows: Vec<GroupCount> = counts
        .into_iter()
        .map(|((year, group), projects)| GroupCount {
            year,
            group: group.to_string(),
            projects,
        })
        .collect();
    // BTreeMap order is (year asc, group asc); flip the year only
    rows.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| a.group.cmp(&b.group)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{parse_date, NewProject, ProjectId};
    use chrono::Utc;

    fn project(id: u32, group: &str, start: &str) -> Project {
        let mut draft = NewProject::new("p", "o");
        draft.group = group.to_string();
        draft.start_date = Some(parse_date(start).unwrap());
        draft.into_project(ProjectId::new(id), Utc::now())
    }

    #[test]
    fn test_empty() {
        assert!(count_by_year_and_group(&Vec::<Project>::new()).is_empty());
    }

    #[test]
    fn test_grouping_and_order() {
        let projects = vec![
            project(0, "Group 1", "2023-03-01"),
            project(1, "Group 2", "2024-01-10"),
            project(2, "Group 1", "2024-06-01"),
            project(3, "Group 1", "2024-07-01"),
        ];

        let rows = count_by_year_and_group(&projects);
        assert_eq!(
            rows,
            vec![
                GroupCount {
                    year: 2024,
                    group: "Group 1".to_string(),
                    projects: 2
                },
                GroupCount {
                    year: 2024,
                    group: "Group 2".to_string(),
                    projects: 1
                },
                GroupCount {
                    year: 2023,
                    group: "Group 1".to_string(),
                    projects: 1
                },
            ]
        );
    }
}
