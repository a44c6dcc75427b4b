pub mod builder;
pub mod catalog;
pub mod config;
pub mod links;
pub mod navigation;
pub mod output;
pub mod template;

use std::path::Path;

// Re-export main types
pub use builder::{BuildError, BuildReport, Generator, SiteBuilder};
pub use catalog::{LoadError, Project, SchemaError, Site, load_catalog};
pub use config::SiteConfig;
pub use links::abs_url;
pub use navigation::Neighbors;
pub use output::WriteError;
pub use template::{TemplateError, TemplateRenderer};

/// Regenerate the whole site from the catalog and templates.
pub fn build_site(
    config: &SiteConfig,
    catalog: &Path,
    templates_dir: &Path,
    output_dir: &Path,
) -> Result<BuildReport, BuildError> {
    SiteBuilder::new()
        .catalog(catalog)
        .templates_dir(templates_dir)
        .output_dir(output_dir)
        .site_config(config.clone())
        .build()?
        .render_all()
}
