//! Catalog loading.
//!
//! The catalog is an XML document listing the portfolio projects in display
//! order:
//!
//! ```xml
//! <projects>
//!   <project>
//!     <title>Alpha</title>
//!     <slug>alpha</slug>
//!     <year>2020</year>
//!     <size>120 x 80 cm</size>
//!     <images>
//!       <source>alpha-1.jpg</source>
//!       <source>alpha-2.jpg</source>
//!     </images>
//!     <description>Oil on canvas.</description>
//!   </project>
//! </projects>
//! ```
//!
//! Missing child elements fall back to empty values. Markup nested inside a
//! text field is skipped and only the field's own text is kept. A field that
//! appears twice keeps the later value, while every `<images>` block adds its
//! sources. A `<year>` that is present but not an integer makes the whole
//! catalog invalid.

use std::path::{Path, PathBuf};

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;
use thiserror::Error;

const ROOT_ELEMENT: &str = "projects";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read catalog {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid catalog {}", path.display())]
    Schema { path: PathBuf, source: SchemaError },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed document")]
    Malformed(#[from] quick_xml::Error),
    #[error("document has no root element")]
    MissingRoot,
    #[error("root element is <{0}>, expected <projects>")]
    UnexpectedRoot(String),
    #[error("document ends inside an open element")]
    Truncated,
    #[error("year `{0}` is not an integer")]
    InvalidYear(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Project {
    pub title: String,
    pub slug: String,
    pub year: i64,
    pub size: String,
    pub images: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Site {
    base_url: String,
    projects: Vec<Project>,
}

impl Site {
    pub fn new(base_url: impl Into<String>, projects: Vec<Project>) -> Self {
        Self {
            base_url: base_url.into(),
            projects,
        }
    }

    /// Parse catalog XML. Project order follows the document.
    pub fn from_xml(xml: &str, base_url: impl Into<String>) -> Result<Self, SchemaError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let projects = read_catalog(&mut reader)?;
        Ok(Self::new(base_url, projects))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Read and parse the catalog at `path`.
pub fn load_catalog<P: AsRef<Path>>(path: P, base_url: &str) -> Result<Site, LoadError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let site = Site::from_xml(&xml, base_url).map_err(|source| LoadError::Schema {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Loaded {} projects from {}", site.len(), path.display());
    Ok(site)
}

type XmlReader<'a> = Reader<&'a [u8]>;

fn read_catalog(reader: &mut XmlReader<'_>) -> Result<Vec<Project>, SchemaError> {
    loop {
        match reader.read_event()? {
            Event::Start(root) => {
                check_root(&root)?;
                return read_projects(reader);
            }
            Event::Empty(root) => {
                check_root(&root)?;
                return Ok(Vec::new());
            }
            Event::Eof => return Err(SchemaError::MissingRoot),
            _ => {}
        }
    }
}

fn check_root(root: &BytesStart<'_>) -> Result<(), SchemaError> {
    let name = String::from_utf8_lossy(root.local_name().as_ref()).into_owned();
    if name != ROOT_ELEMENT {
        return Err(SchemaError::UnexpectedRoot(name));
    }
    Ok(())
}

fn read_projects(reader: &mut XmlReader<'_>) -> Result<Vec<Project>, SchemaError> {
    let mut projects = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"project" => {
                projects.push(read_project(reader)?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"project" => {
                projects.push(Project::default());
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => return Ok(projects),
            Event::Eof => return Err(SchemaError::Truncated),
            _ => {}
        }
    }
}

fn read_project(reader: &mut XmlReader<'_>) -> Result<Project, SchemaError> {
    let mut project = Project::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"title" => project.title = read_text(reader)?,
                b"slug" => project.slug = read_text(reader)?,
                b"year" => project.year = parse_year(&read_text(reader)?)?,
                b"size" => project.size = read_text(reader)?,
                b"images" => project.images.extend(read_images(reader)?),
                b"description" => project.description = read_text(reader)?,
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"title" => project.title.clear(),
                b"slug" => project.slug.clear(),
                b"year" => project.year = 0,
                b"size" => project.size.clear(),
                b"description" => project.description.clear(),
                _ => {}
            },
            Event::End(_) => return Ok(project),
            Event::Eof => return Err(SchemaError::Truncated),
            _ => {}
        }
    }
}

fn read_images(reader: &mut XmlReader<'_>) -> Result<Vec<String>, SchemaError> {
    let mut sources = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"source" => {
                sources.push(read_text(reader)?);
            }
            Event::Empty(e) if e.local_name().as_ref() == b"source" => {
                sources.push(String::new());
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => return Ok(sources),
            Event::Eof => return Err(SchemaError::Truncated),
            _ => {}
        }
    }
}

/// Character data of the current element up to its end tag. Child elements
/// and their text are skipped.
fn read_text(reader: &mut XmlReader<'_>) -> Result<String, SchemaError> {
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let raw = String::from_utf8_lossy(&e);
                text.push_str(&unescape(&raw).map_err(quick_xml::Error::from)?);
            }
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) => text.push_str(&resolve_reference(&e)?),
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => return Ok(text.trim().to_string()),
            Event::Eof => return Err(SchemaError::Truncated),
            _ => {}
        }
    }
}

// `&amp;`, `&#233;` and friends arrive as a bare name between `&` and `;`.
fn resolve_reference(name: &[u8]) -> Result<String, SchemaError> {
    let reference = format!("&{};", String::from_utf8_lossy(name));
    let resolved = unescape(&reference).map_err(quick_xml::Error::from)?;
    Ok(resolved.into_owned())
}

fn parse_year(text: &str) -> Result<i64, SchemaError> {
    if text.is_empty() {
        return Ok(0);
    }
    text.parse()
        .map_err(|_| SchemaError::InvalidYear(text.to_string()))
}
