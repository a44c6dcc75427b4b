use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::catalog::{self, LoadError, Project, Site};
use crate::config::SiteConfig;
use crate::navigation;
use crate::output::{self, WriteError};
use crate::template::{TemplateError, TemplateRenderer};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("could not load the catalog")]
    Load(#[from] LoadError),
    #[error("could not render pages")]
    Template(#[from] TemplateError),
    #[error("could not write output")]
    Write(#[from] WriteError),
}

/// Applied to every rendered page before it is written.
pub type PostProcess = Box<dyn Fn(String) -> String + Send + Sync>;

pub struct SiteBuilder {
    catalog: PathBuf,
    templates_dir: PathBuf,
    output_dir: PathBuf,
    site: SiteConfig,
    post_process: Option<PostProcess>,
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self {
            catalog: PathBuf::from("./content/projects.xml"),
            templates_dir: PathBuf::from("./templates"),
            output_dir: PathBuf::from("./docs"),
            site: SiteConfig::default(),
            post_process: None,
        }
    }

    pub fn catalog<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.catalog = path.as_ref().to_path_buf();
        self
    }

    pub fn templates_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.templates_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn site_config(mut self, config: SiteConfig) -> Self {
        self.site = config;
        self
    }

    pub fn post_process<F>(mut self, f: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.post_process = Some(Box::new(f));
        self
    }

    /// Load the catalog and parse the templates.
    ///
    /// Nothing is written yet, so a broken catalog or template leaves the
    /// output directory untouched.
    pub fn build(self) -> Result<Generator, BuildError> {
        let site = catalog::load_catalog(&self.catalog, &self.site.base_url)?;
        let renderer = TemplateRenderer::load(&self.templates_dir, site.base_url())?;

        Ok(Generator {
            site,
            renderer,
            output_dir: self.output_dir,
            post_process: self.post_process,
        })
    }
}

/// Pages written by [`Generator::render_all`].
#[derive(Debug, Default)]
pub struct BuildReport {
    pub project_pages: Vec<PathBuf>,
    pub index_page: PathBuf,
}

impl BuildReport {
    pub fn page_count(&self) -> usize {
        self.project_pages.len() + 1
    }
}

pub struct Generator {
    site: Site,
    renderer: TemplateRenderer,
    output_dir: PathBuf,
    post_process: Option<PostProcess>,
}

impl Generator {
    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render and write every project page in catalog order, then the index.
    ///
    /// Stops at the first error. Pages written before it stay on disk.
    pub fn render_all(&self) -> Result<BuildReport, BuildError> {
        check_slugs(self.site.projects());

        let mut report = BuildReport::default();

        for page in navigation::iter(self.site.projects()) {
            let html = self.renderer.render_project(&page, &self.site)?;
            let path = output::project_page_path(&self.output_dir, &page.project.slug);
            self.write(&path, html)?;
            report.project_pages.push(path);
        }

        let html = self.renderer.render_index(&self.site)?;
        let path = output::index_page_path(&self.output_dir);
        self.write(&path, html)?;
        report.index_page = path;

        log::info!(
            "Wrote {} pages to {}",
            report.page_count(),
            self.output_dir.display()
        );

        Ok(report)
    }

    fn write(&self, path: &Path, html: String) -> Result<(), WriteError> {
        let html = match &self.post_process {
            Some(f) => f(html),
            None => html,
        };

        output::write_page(path, &html)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

// Slugs are expected to be non-empty and unique but are not enforced.
fn check_slugs(projects: &[Project]) {
    let mut seen = HashSet::new();

    for project in projects {
        if project.slug.is_empty() {
            log::warn!(
                "Project `{}` has an empty slug, the index page will replace it",
                project.title
            );
        } else if !seen.insert(project.slug.as_str()) {
            log::warn!(
                "Slug `{}` is used more than once, only the last page with it is kept",
                project.slug
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = "{{ project.slug }}";
    const INDEX: &str = "{% for p in site.projects %}{{ p.slug }} {% endfor %}";

    fn fixture(catalog: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("projects.xml"), catalog).unwrap();
        std::fs::create_dir(dir.path().join("templates")).unwrap();
        std::fs::write(dir.path().join("templates/project.tmpl"), PROJECT).unwrap();
        std::fs::write(dir.path().join("templates/index.tmpl"), INDEX).unwrap();
        dir
    }

    fn builder(dir: &Path) -> SiteBuilder {
        SiteBuilder::new()
            .catalog(dir.join("projects.xml"))
            .templates_dir(dir.join("templates"))
            .output_dir(dir.join("out"))
    }

    #[test]
    fn renders_every_project_and_the_index() {
        let dir = fixture(
            "<projects><project><slug>a</slug></project><project><slug>b</slug></project></projects>",
        );

        let report = builder(dir.path()).build().unwrap().render_all().unwrap();

        assert_eq!(report.page_count(), 3);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/a/index.html")).unwrap(),
            "a"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/index.html")).unwrap(),
            "a b "
        );
    }

    #[test]
    fn build_loads_catalog_without_writing() {
        let dir = fixture("<projects><project><slug>a</slug></project></projects>");

        let generator = builder(dir.path())
            .site_config(SiteConfig::new("https://example.com/"))
            .build()
            .unwrap();

        assert_eq!(generator.site().len(), 1);
        assert_eq!(generator.site().base_url(), "https://example.com/");
        assert_eq!(generator.output_dir(), dir.path().join("out"));
        assert!(!generator.output_dir().exists());
    }

    #[test]
    fn empty_catalog_writes_only_the_index() {
        let dir = fixture("<projects/>");

        let report = builder(dir.path()).build().unwrap().render_all().unwrap();

        assert!(report.project_pages.is_empty());
        assert_eq!(report.index_page, dir.path().join("out/index.html"));
        assert!(report.index_page.exists());
    }

    #[test]
    fn post_process_runs_on_every_page() {
        let dir = fixture("<projects><project><slug>a</slug></project></projects>");

        builder(dir.path())
            .post_process(|html| format!("[{html}]"))
            .build()
            .unwrap()
            .render_all()
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/a/index.html")).unwrap(),
            "[a]"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/index.html")).unwrap(),
            "[a ]"
        );
    }

    #[test]
    fn duplicate_slug_keeps_last_page() {
        let dir = fixture(
            "<projects>\
             <project><slug>a</slug><title>first</title></project>\
             <project><slug>a</slug><title>second</title></project>\
             </projects>",
        );
        std::fs::write(dir.path().join("templates/project.tmpl"), "{{ project.title }}").unwrap();

        builder(dir.path()).build().unwrap().render_all().unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/a/index.html")).unwrap(),
            "second"
        );
    }

    #[test]
    fn missing_catalog_is_a_load_error() {
        let dir = fixture("<projects/>");
        std::fs::remove_file(dir.path().join("projects.xml")).unwrap();

        let err = builder(dir.path()).build().err().unwrap();
        assert!(matches!(err, BuildError::Load(LoadError::Io { .. })));
    }

    #[test]
    fn broken_template_fails_before_writing() {
        let dir = fixture("<projects><project><slug>a</slug></project></projects>");
        std::fs::write(dir.path().join("templates/index.tmpl"), "{% for %}").unwrap();

        let err = builder(dir.path()).build().err().unwrap();
        assert!(matches!(err, BuildError::Template(TemplateError::Parse { .. })));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn render_error_stops_the_run() {
        let dir = fixture("<projects><project><slug>a</slug></project></projects>");
        std::fs::write(dir.path().join("templates/project.tmpl"), "{{ missing }}").unwrap();

        let err = builder(dir.path()).build().unwrap().render_all().unwrap_err();
        assert!(matches!(err, BuildError::Template(TemplateError::Render { .. })));
        assert!(!dir.path().join("out/index.html").exists());
    }
}
