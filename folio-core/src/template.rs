use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::{Context, Tera, Value};
use thiserror::Error;

use crate::catalog::Site;
use crate::links;
use crate::navigation::Neighbors;

pub const PROJECT_TEMPLATE: &str = "project";
pub const INDEX_TEMPLATE: &str = "index";

const TEMPLATE_EXTENSION: &str = "tmpl";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse template `{name}`")]
    Parse { name: String, source: tera::Error },
    #[error("failed to render template `{name}`")]
    Render { name: String, source: tera::Error },
}

/// Parsed page templates plus the helpers they can call.
///
/// Templates are parsed once and reused for every page rendered with them.
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// A renderer with no templates and `abs_url` bound to `base_url`.
    pub fn new(base_url: &str) -> Self {
        let mut tera = Tera::default();
        tera.register_function("abs_url", abs_url_function(base_url.to_string()));

        Self { tera }
    }

    /// Load `project.tmpl` and `index.tmpl` from `templates_dir`.
    pub fn load<P: AsRef<Path>>(templates_dir: P, base_url: &str) -> Result<Self, TemplateError> {
        let templates_dir = templates_dir.as_ref();
        let mut renderer = Self::new(base_url);

        for name in [PROJECT_TEMPLATE, INDEX_TEMPLATE] {
            let path = templates_dir.join(format!("{name}.{TEMPLATE_EXTENSION}"));
            let source = std::fs::read_to_string(&path)
                .map_err(|source| TemplateError::Io { path: path.clone(), source })?;
            renderer.add_template(name, &source)?;
            log::debug!("Parsed template `{}` from {}", name, path.display());
        }

        Ok(renderer)
    }

    pub fn add_template(&mut self, name: &str, source: &str) -> Result<(), TemplateError> {
        self.tera
            .add_raw_template(name, source)
            .map_err(|source| TemplateError::Parse {
                name: name.to_string(),
                source,
            })
    }

    /// Render a template with an arbitrary context
    pub fn render(&self, name: &str, context: &Context) -> Result<String, TemplateError> {
        self.tera
            .render(name, context)
            .map_err(|source| TemplateError::Render {
                name: name.to_string(),
                source,
            })
    }

    /// Render a project page. `prev` and `next` are null at the ends of the
    /// catalog.
    pub fn render_project(&self, page: &Neighbors<'_>, site: &Site) -> Result<String, TemplateError> {
        let mut context = Context::new();
        context.insert("project", page.project);
        context.insert("prev", &page.prev);
        context.insert("next", &page.next);
        context.insert("site", site);

        self.render(PROJECT_TEMPLATE, &context)
    }

    pub fn render_index(&self, site: &Site) -> Result<String, TemplateError> {
        let mut context = Context::new();
        context.insert("site", site);

        self.render(INDEX_TEMPLATE, &context)
    }
}

// `{{ abs_url(path="img/a.jpg") }}`
fn abs_url_function(base_url: String) -> impl tera::Function {
    move |args: &HashMap<String, Value>| -> tera::Result<Value> {
        let path = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| tera::Error::msg("abs_url requires a string `path` argument"))?;

        Ok(Value::String(links::abs_url(&base_url, path)))
    }
}
