//! Development server with live reload

mod error;

pub use error::ServerError;

use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::resolver::{ResolveError, Resolver};
use crate::templates::TemplateRenderer;
use crate::Coursebook;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Server state shared by all handlers
pub struct ServerState {
    site: Coursebook,
    renderer: TemplateRenderer,
    /// Swapped as a whole when content changes
    resolver: RwLock<Resolver>,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

impl ServerState {
    /// Load the content registry and templates
    pub fn new(site: &Coursebook, live_reload: bool) -> Result<Self> {
        let (reload_tx, _) = broadcast::channel::<()>(16);

        Ok(Self {
            site: site.clone(),
            renderer: TemplateRenderer::new()?,
            resolver: RwLock::new(site.resolver()?),
            reload_tx,
            live_reload,
        })
    }

    /// Snapshot of the current resolver
    pub async fn resolver(&self) -> Resolver {
        self.resolver.read().await.clone()
    }

    /// Rebuild the registry from disk and notify live reload clients.
    /// On failure the previous registry stays in place.
    pub async fn reload(&self) -> Result<usize> {
        let registry = self.site.load_registry()?;
        let count = registry.len();

        *self.resolver.write().await = Resolver::new(Arc::new(registry));
        let _ = self.reload_tx.send(());

        Ok(count)
    }

    fn page(&self, status: StatusCode, html: String) -> Response {
        let html = if self.live_reload {
            inject_live_reload(&html)
        } else {
            html
        };
        (status, Html(html)).into_response()
    }

    fn not_found(&self, request_path: &str) -> Result<Response, ServerError> {
        let html = self
            .renderer
            .render_not_found(&self.site.config, request_path)?;
        Ok(self.page(StatusCode::NOT_FOUND, html))
    }
}

/// Build the application router, with pages mounted under `config.root`
pub fn router(state: Arc<ServerState>) -> Router {
    let prefix = format!("/{}", state.site.config.root.trim_matches('/'));
    let prefix = prefix.trim_end_matches('/');

    let mut router = Router::new()
        .route(&format!("{}/", prefix), get(index_handler))
        .route(&format!("{}/:slug", prefix), get(document_handler))
        .route(&format!("{}/:slug/", prefix), get(document_handler))
        .nest_service(
            &format!("{}/static", prefix),
            ServeDir::new(&state.site.static_dir),
        );

    if !prefix.is_empty() {
        router = router.route(prefix, get(index_handler));
    }

    if state.live_reload {
        router = router.route("/__livereload", get(livereload_handler));
    }

    router
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the development server
pub async fn start(site: &Coursebook, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(site, watch)?);
    let app = router(Arc::clone(&state));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching {:?}", site.content_dir);
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let handle = tokio::runtime::Handle::current();
        let watch_state = Arc::clone(&state);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(watch_state, handle) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch the content directory and rebuild the registry on change
fn watch_and_reload(state: Arc<ServerState>, handle: tokio::runtime::Handle) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Debounce so a burst of saves triggers one rebuild
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    let content_dir = state.site.content_dir.clone();
    if !content_dir.exists() {
        tracing::warn!("Not watching {:?}: directory does not exist", content_dir);
        return Ok(());
    }
    debouncer
        .watcher()
        .watch(&content_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching: {:?}", content_dir);

    for result in rx {
        match result {
            Ok(events) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        let path_str = e.path.to_string_lossy();
                        !path_str.contains(".DS_Store") && !path_str.ends_with('~')
                    })
                    .collect();

                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    tracing::info!("File changed: {}", event.path.display());
                }

                match handle.block_on(state.reload()) {
                    Ok(count) => tracing::info!("Reloaded {} documents", count),
                    Err(e) => tracing::error!("Reload failed, keeping previous content: {:#}", e),
                }
            }
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
            }
        }
    }

    Ok(())
}

/// Handle GET /
async fn index_handler(State(state): State<Arc<ServerState>>) -> Result<Response, ServerError> {
    let resolver = state.resolver().await;
    let html = state
        .renderer
        .render_index(&state.site.config, resolver.registry())?;
    Ok(state.page(StatusCode::OK, html))
}

/// Handle GET /{slug}
async fn document_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
    uri: Uri,
) -> Result<Response, ServerError> {
    let request_path = uri.path();
    let resolver = state.resolver().await;

    match resolver.resolve(&slug, request_path) {
        Ok(resolved) => {
            let html = state
                .renderer
                .render_document(&state.site.config, &resolved)?;
            Ok(state.page(StatusCode::OK, html))
        }
        Err(ResolveError::NotFound { .. }) => state.not_found(request_path),
    }
}

/// Any path no route matches
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
) -> Result<Response, ServerError> {
    state.not_found(uri.path())
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replacen("</body>", LIVE_RELOAD_SCRIPT, 1)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
