use serde::Serialize;

use crate::catalog::Project;

/// A project together with its neighbours in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Neighbors<'a> {
    pub project: &'a Project,
    pub prev: Option<&'a Project>,
    pub next: Option<&'a Project>,
}

/// Link the project at `index` to the entries on either side of it.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
pub fn neighbors(projects: &[Project], index: usize) -> Neighbors<'_> {
    Neighbors {
        project: &projects[index],
        prev: index.checked_sub(1).map(|i| &projects[i]),
        next: projects.get(index + 1),
    }
}

/// Neighbours for every project, in catalog order.
pub fn iter(projects: &[Project]) -> impl Iterator<Item = Neighbors<'_>> {
    (0..projects.len()).map(move |index| neighbors(projects, index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(slug: &str) -> Project {
        Project {
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    fn slug(project: Option<&Project>) -> Option<&str> {
        project.map(|p| p.slug.as_str())
    }

    #[test]
    fn single_project_has_no_neighbors() {
        let projects = vec![project("only")];
        let linked = neighbors(&projects, 0);

        assert_eq!(linked.project.slug, "only");
        assert!(linked.prev.is_none());
        assert!(linked.next.is_none());
    }

    #[test]
    fn neighbors_follow_catalog_order() {
        let projects = vec![project("a"), project("b"), project("c")];

        let first = neighbors(&projects, 0);
        assert_eq!(slug(first.prev), None);
        assert_eq!(slug(first.next), Some("b"));

        let middle = neighbors(&projects, 1);
        assert_eq!(slug(middle.prev), Some("a"));
        assert_eq!(slug(middle.next), Some("c"));

        let last = neighbors(&projects, 2);
        assert_eq!(slug(last.prev), Some("b"));
        assert_eq!(slug(last.next), None);
    }

    #[test]
    fn prev_and_next_are_adjacent_for_every_entry() {
        let projects: Vec<Project> = (0..7).map(|i| project(&format!("p{i}"))).collect();
        let n = projects.len();

        for (i, linked) in iter(&projects).enumerate() {
            assert_eq!(linked.project, &projects[i]);
            assert_eq!(linked.prev.is_some(), i > 0);
            assert_eq!(linked.next.is_some(), i < n - 1);
            if let Some(prev) = linked.prev {
                assert_eq!(prev, &projects[i - 1]);
            }
            if let Some(next) = linked.next {
                assert_eq!(next, &projects[i + 1]);
            }
        }
    }

    #[test]
    fn iter_on_empty_catalog_yields_nothing() {
        assert_eq!(iter(&[]).count(), 0);
    }
}
