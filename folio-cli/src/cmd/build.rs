use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use folio_core::build_site;
use std::path::Path;
use crate::config::load_build_config;

/// Flags shared by `build` and `serve`. Defaults live in `BuildConfig` so a
/// config file or env var is not shadowed by an unset flag.
pub fn add_build_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("catalog")
                .short('c')
                .long("catalog")
                .value_name("FILE")
                .help("Catalog of projects [default: ./content/projects.xml]"),
        )
        .arg(
            Arg::new("templates")
                .short('t')
                .long("templates")
                .value_name("DIR")
                .help("Directory with project.tmpl and index.tmpl [default: ./templates]"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for generated site [default: ./docs]"),
        )
        .arg(
            Arg::new("base-url")
                .short('b')
                .long("base-url")
                .value_name("URL")
                .help("Base URL used by abs_url, e.g. for GitHub Pages"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Configuration file [default: ./folio.toml]"),
        )
}

pub fn make_subcommand() -> Command {
    add_build_args(Command::new("build"))
        .about("Generate the site from the catalog and templates")
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = load_build_config(args)?;
    let build_config = config.build_config();

    let catalog = Path::new(&build_config.catalog);
    let templates_dir = Path::new(&build_config.templates);
    let output_dir = Path::new(&build_config.output);

    let report = build_site(&config.site, catalog, templates_dir, output_dir)
        .with_context(|| format!("Failed to build site from {}", catalog.display()))?;

    log::info!(
        "Site built successfully in {} ({} projects)",
        output_dir.display(),
        report.project_pages.len()
    );

    Ok(())
}
