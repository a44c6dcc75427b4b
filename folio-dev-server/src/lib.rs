//! Preview server for a generated site.
//!
//! Serves the output directory over HTTP and tells connected pages to reload
//! whenever a generated page under it changes. Every folio page is written
//! as `index.html`, so other files (editor swap files, assets copied in by
//! hand) do not trigger a reload.

use anyhow::Result;
use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use notify::Watcher;
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

pub const LIVERELOAD_PATH: &str = "/__livereload";

const RELOAD: &str = "reload";
const PAGE_FILE: &str = "index.html";
const MIN_RELOAD_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration for the live development server
#[derive(Debug, Clone)]
pub struct LiveServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Root directory to serve and watch
    pub root: PathBuf,
    /// Auto-open browser
    pub open: bool,
    /// Paths containing any of these substrings do not trigger a reload
    pub ignore: Vec<String>,
}

impl Default for LiveServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            root: PathBuf::from("./docs"),
            open: false,
            ignore: vec![],
        }
    }
}

impl LiveServerConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

pub struct LiveServer {
    config: LiveServerConfig,
}

impl LiveServer {
    pub fn new(config: LiveServerConfig) -> Self {
        Self { config }
    }

    /// Serve until the listener fails.
    pub async fn run(self) -> Result<()> {
        if !self.config.root.is_dir() {
            anyhow::bail!("Output directory does not exist: {}", self.config.root.display());
        }

        let (reload_tx, _) = broadcast::channel::<String>(100);

        let watch_root = self.config.root.clone();
        let ignore = self.config.ignore.clone();
        let watcher_tx = reload_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_output(watch_root, watcher_tx, ignore).await {
                log::error!("Output watcher error: {:#}", e);
            }
        });

        let app = router(self.config.root.clone(), reload_tx);
        let addr = self.config.addr()?;

        log::info!("Serving {} at http://{}", self.config.root.display(), addr);

        if self.config.open {
            if let Err(e) = open::that(format!("http://{}", addr)) {
                log::warn!("Failed to open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

fn router(root: PathBuf, reload_tx: broadcast::Sender<String>) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(websocket_handler))
        .fallback_service(ServeDir::new(root))
        .with_state(reload_tx)
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(reload_tx): State<broadcast::Sender<String>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward_reloads(socket, reload_tx.subscribe()))
}

async fn forward_reloads(mut socket: WebSocket, mut reloads: broadcast::Receiver<String>) {
    loop {
        tokio::select! {
            msg = reloads.recv() => {
                let Ok(msg) = msg else { break };
                if socket.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                if msg.is_none() {
                    break;
                }
            }
        }
    }
}

async fn watch_output(
    root: PathBuf,
    reload_tx: broadcast::Sender<String>,
    ignore: Vec<String>,
) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut debouncer = new_debouncer(Duration::from_millis(500), move |res: DebounceEventResult| {
        let Ok(events) = res else { return };
        for event in events {
            if is_page(&event.path) && !is_ignored(&event.path.to_string_lossy(), &ignore) {
                let _ = tx.blocking_send(event.path);
            }
        }
    })?;

    debouncer
        .watcher()
        .watch(&root, notify::RecursiveMode::Recursive)?;

    // A rebuild touches every page; one reload per burst is enough
    let mut last_reload: Option<Instant> = None;
    while let Some(path) = rx.recv().await {
        log::debug!("Page changed: {}", path.display());

        let now = Instant::now();
        if last_reload.is_some_and(|at| now.duration_since(at) < MIN_RELOAD_INTERVAL) {
            continue;
        }

        // No receivers just means no page is open
        let _ = reload_tx.send(RELOAD.to_string());
        last_reload = Some(now);
        log::info!("Reloading connected pages");
    }

    Ok(())
}

fn is_page(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == PAGE_FILE)
}

fn is_ignored(path: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| path.contains(pattern.trim_start_matches('*')))
}

/// Add the live-reload client to a rendered page, just before `</body>` when
/// there is one.
pub fn inject_livereload_script(html: &str) -> String {
    let script = format!(
        r#"<script>
(function() {{
    const socket = new WebSocket('ws://' + location.host + '{LIVERELOAD_PATH}');
    socket.onmessage = function(event) {{
        if (event.data === '{RELOAD}') {{
            location.reload();
        }}
    }};
}})();
</script>
"#
    );

    match html.rfind("</body>") {
        Some(pos) => {
            let mut page = String::with_capacity(html.len() + script.len());
            page.push_str(&html[..pos]);
            page.push_str(&script);
            page.push_str(&html[pos..]);
            page
        }
        None => format!("{}{}", html, script),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_goes_before_closing_body() {
        let page = inject_livereload_script("<html><body><p>hi</p></body></html>");

        let script = page.find("<script>").unwrap();
        assert!(page.find("<p>hi</p>").unwrap() < script);
        assert!(script < page.find("</body>").unwrap());
        assert!(page.contains(LIVERELOAD_PATH));
    }

    #[test]
    fn script_is_appended_without_body() {
        let page = inject_livereload_script("<p>fragment</p>");
        assert!(page.starts_with("<p>fragment</p><script>"));
    }

    #[test]
    fn ignore_patterns_match_substrings() {
        let patterns = vec![".git".to_string(), "*.tmp".to_string()];
        assert!(is_ignored("/site/.git/HEAD", &patterns));
        assert!(is_ignored("/site/alpha/index.html.tmp", &patterns));
        assert!(!is_ignored("/site/alpha/index.html", &patterns));
    }

    #[test]
    fn only_generated_pages_trigger_reload() {
        assert!(is_page(Path::new("/site/docs/index.html")));
        assert!(is_page(Path::new("/site/docs/alpha/index.html")));
        assert!(!is_page(Path::new("/site/docs/alpha/index.html.tmp")));
        assert!(!is_page(Path::new("/site/docs/img/alpha-1.jpg")));
        assert!(!is_page(Path::new("/site/docs/alpha")));
    }

    #[test]
    fn addr_parses_host_and_port() {
        let config = LiveServerConfig {
            port: 4000,
            ..Default::default()
        };
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:4000");
    }
}
