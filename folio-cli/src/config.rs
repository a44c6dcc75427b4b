use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use folio_core::SiteConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "./folio.toml";

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FolioConfig {
    /// Where to read inputs and write the site
    pub build: BuildConfig,
    /// Settings passed through to folio-core
    pub site: SiteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Catalog XML file
    pub catalog: String,
    /// Directory holding project.tmpl and index.tmpl
    pub templates: String,
    /// Output directory for generated site
    pub output: String,
    /// Configuration file path
    pub config: String,
    /// Host for dev server
    pub host: String,
    /// Port for dev server
    pub port: u16,
    /// Open browser automatically
    pub open: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            catalog: "./content/projects.xml".to_string(),
            templates: "./templates".to_string(),
            output: "./docs".to_string(),
            config: DEFAULT_CONFIG_FILE.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
        }
    }
}

impl FolioConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (FOLIO_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let config_file = string_arg(args, "config").unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut builder = ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Self::default())?);

        if Path::new(&config_file).exists() {
            log::debug!("Reading configuration from {}", config_file);
            builder = builder.add_source(File::from(Path::new(&config_file)));
        }

        builder = builder.add_source(
            Environment::with_prefix("FOLIO")
                .prefix_separator("_")
                .separator("__"), // FOLIO_SITE__BASE_URL -> site.base_url
        );

        for (arg, key) in [
            ("catalog", "build.catalog"),
            ("templates", "build.templates"),
            ("output", "build.output"),
            ("config", "build.config"),
            ("host", "build.host"),
            ("base-url", "site.base_url"),
        ] {
            if let Some(value) = string_arg(args, arg) {
                builder = builder.set_override(key, value)?;
            }
        }
        if let Ok(Some(port)) = args.try_get_one::<u16>("port") {
            builder = builder.set_override("build.port", i64::from(*port))?;
        }
        if let Ok(Some(true)) = args.try_get_one::<bool>("open") {
            builder = builder.set_override("build.open", true)?;
        }

        let config: FolioConfig = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// Get the build configuration
    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }
}

/// Load configuration specifically for build commands
pub fn load_build_config(args: &ArgMatches) -> Result<FolioConfig> {
    FolioConfig::load(args)
}

/// Load configuration specifically for serve commands
pub fn load_serve_config(args: &ArgMatches) -> Result<FolioConfig> {
    FolioConfig::load(args)
}

// Commands only define the args they use, so missing ids are not an error.
fn string_arg(args: &ArgMatches, id: &str) -> Option<String> {
    args.try_get_one::<String>(id).ok().flatten().cloned()
}
