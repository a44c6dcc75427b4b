use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::links::escape_segment;

const PAGE_FILE: &str = "index.html";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `<output_root>/<escaped slug>/index.html`
pub fn project_page_path<P: AsRef<Path>>(output_root: P, slug: &str) -> PathBuf {
    output_root
        .as_ref()
        .join(escape_segment(slug))
        .join(PAGE_FILE)
}

/// `<output_root>/index.html`
pub fn index_page_path<P: AsRef<Path>>(output_root: P) -> PathBuf {
    output_root.as_ref().join(PAGE_FILE)
}

/// Write `contents` to `path`, creating parent directories and replacing any
/// existing file.
pub fn write_page<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), WriteError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, contents).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_pages_live_in_a_slug_directory() {
        assert_eq!(
            project_page_path("docs", "alpha"),
            PathBuf::from("docs").join("alpha").join("index.html")
        );
        assert_eq!(index_page_path("docs"), PathBuf::from("docs").join("index.html"));
    }

    #[test]
    fn reserved_characters_stay_in_one_segment() {
        let root = Path::new("docs");
        for slug in ["blue period", "a/b", "../up", "..", "x?y#z"] {
            let path = project_page_path(root, slug);
            let relative = path.strip_prefix(root).unwrap();
            let components: Vec<_> = relative.components().collect();

            assert_eq!(components.len(), 2, "{slug} produced {}", path.display());
            assert!(matches!(components[0], std::path::Component::Normal(_)));
        }

        assert_eq!(
            project_page_path(root, "blue period"),
            root.join("blue%20period").join("index.html")
        );
    }

    #[test]
    fn write_page_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = project_page_path(dir.path().join("out"), "alpha");

        write_page(&path, "<p>alpha</p>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>alpha</p>");
    }

    #[test]
    fn write_page_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_page_path(dir.path());

        write_page(&path, "a much longer first version").unwrap();
        write_page(&path, "short").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn write_page_reports_blocked_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("alpha");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = write_page(blocker.join("index.html"), "x").unwrap_err();
        assert!(matches!(err, WriteError::CreateDir { .. }));
    }
}
