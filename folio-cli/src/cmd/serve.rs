use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use folio_core::{BuildReport, SiteBuilder};
use folio_dev_server::{LiveServer, LiveServerConfig, inject_livereload_script};
use notify::Watcher;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use crate::cmd::build::add_build_args;
use crate::config::{FolioConfig, load_serve_config};

pub fn make_subcommand() -> Command {
    add_build_args(Command::new("serve"))
        .about("Start a preview server that rebuilds on every change")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16))
                .help("Port to serve on [default: 3000]"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to [default: 127.0.0.1]"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = serve_config(args)?;
    let build_config = config.build_config().clone();

    rebuild(config.clone()).await?;

    let server = LiveServer::new(LiveServerConfig {
        host: build_config.host.clone(),
        port: build_config.port,
        root: PathBuf::from(&build_config.output),
        open: build_config.open,
        ignore: vec![".git".to_string(), "*.tmp".to_string()],
    });
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            log::error!("Dev server error: {:#}", e);
        }
    });

    let args = args.clone();
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watch_inputs(config, args).await {
            log::error!("Input watcher error: {:#}", e);
        }
    });

    let _ = tokio::try_join!(server_handle, watcher_handle)?;

    Ok(())
}

fn serve_config(args: &ArgMatches) -> Result<FolioConfig> {
    let mut config = load_serve_config(args)?;
    let build_config = config.build_config().clone();

    // Absolute links must point at the preview server, not the real site
    config.site.dev(build_config.host, build_config.port);

    Ok(config)
}

/// Full regeneration with the live-reload script in every page.
///
/// The pipeline does blocking file I/O, so it runs on the blocking pool.
async fn rebuild(config: FolioConfig) -> Result<BuildReport> {
    tokio::task::spawn_blocking(move || render_site(&config)).await?
}

fn render_site(config: &FolioConfig) -> Result<BuildReport> {
    let build_config = config.build_config();

    let generator = SiteBuilder::new()
        .catalog(&build_config.catalog)
        .templates_dir(&build_config.templates)
        .output_dir(&build_config.output)
        .site_config(config.site.clone())
        .post_process(|html| inject_livereload_script(&html))
        .build()?;

    log::debug!(
        "Rendering {} projects into {}",
        generator.site().len(),
        generator.output_dir().display()
    );

    Ok(generator.render_all()?)
}

async fn watch_inputs(config: FolioConfig, args: ArgMatches) -> Result<()> {
    let build_config = config.build_config();
    let catalog = PathBuf::from(&build_config.catalog);
    let templates_dir = PathBuf::from(&build_config.templates);
    let config_file = PathBuf::from(&build_config.config);

    let (tx, mut rx) = tokio::sync::mpsc::channel::<Vec<PathBuf>>(100);

    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                let _ = tx.blocking_send(events.into_iter().map(|e| e.path).collect());
            }
            Err(e) => log::warn!("Watch error: {}", e),
        },
    )?;

    // Editors often replace files on save, so watch the catalog's directory
    let catalog_dir = catalog
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    debouncer
        .watcher()
        .watch(catalog_dir, notify::RecursiveMode::NonRecursive)?;
    log::info!("Watching catalog: {}", catalog.display());

    if templates_dir.exists() {
        debouncer
            .watcher()
            .watch(&templates_dir, notify::RecursiveMode::Recursive)?;
        log::info!("Watching templates: {}", templates_dir.display());
    }

    if config_file.exists() {
        debouncer
            .watcher()
            .watch(&config_file, notify::RecursiveMode::NonRecursive)?;
        log::info!("Watching config file: {}", config_file.display());
    }

    let abs_catalog = absolute(&catalog);
    let abs_templates_dir = absolute(&templates_dir);
    let abs_config_file = absolute(&config_file);

    while let Some(paths) = rx.recv().await {
        let changed = paths.iter().map(|p| absolute(p)).find(|p| {
            p == &abs_catalog || p.starts_with(&abs_templates_dir) || p == &abs_config_file
        });

        let Some(changed) = changed else {
            log::debug!("Ignoring changes outside the inputs: {:?}", paths);
            continue;
        };

        log::info!("Input changed: {}", changed.display());

        // Pick up edits to folio.toml too
        let config = match serve_config(&args) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Config error: {:#}", e);
                continue;
            }
        };
        match rebuild(config).await {
            Ok(report) => log::info!("Site rebuilt ({} pages)", report.page_count()),
            Err(e) => log::error!("Build error: {:#}", e),
        }
    }

    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
