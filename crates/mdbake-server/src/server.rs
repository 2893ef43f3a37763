//! Live preview server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use mdbake_docs::discover;
use mdbake_render::BatchConverter;

use crate::reload::{reload_client_script, ReloadHub, ReloadMessage};
use crate::watcher::{apply_watch_event, FileWatcher};

const RELOAD_WS_PATH: &str = "/__reload";
const RELOAD_SCRIPT_PATH: &str = "/__reload.js";

/// Configuration for the preview server.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("Initial conversion failed: {0}")]
    ConvertError(String),
}

/// Shared server state.
struct ServerState {
    converter: Arc<BatchConverter>,
    hub: ReloadHub,
}

/// Serves rendered documents and reloads them when their sources change.
pub struct PreviewServer {
    config: PreviewConfig,
    converter: Arc<BatchConverter>,
}

impl PreviewServer {
    /// Create a new preview server over the converter's content root.
    pub fn new(config: PreviewConfig, converter: Arc<BatchConverter>) -> Self {
        Self { config, converter }
    }

    /// Convert once, then serve and watch until the process is stopped.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        let converter = Arc::clone(&self.converter);
        let summary = tokio::task::spawn_blocking(move || converter.convert())
            .await
            .map_err(|e| ServerError::ConvertError(e.to_string()))?
            .map_err(|e| ServerError::ConvertError(e.to_string()))?;
        tracing::info!(
            "Rendered {} of {} documents",
            summary.converted,
            summary.total
        );

        let root = self.converter.config().root.clone();
        let state = Arc::new(ServerState {
            converter: Arc::clone(&self.converter),
            hub: ReloadHub::new(),
        });

        let (watcher, mut rx) = FileWatcher::new(
            &[root.clone()],
            self.converter.config().discover.clone(),
        )
        .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match apply_watch_event(&state_clone.converter, event).await {
                    Ok(Some(output)) => {
                        let path = url_path(&state_clone.converter.config().root, &output);
                        tracing::debug!(
                            "Reloading {} clients for {}",
                            state_clone.hub.subscriber_count(),
                            output.display()
                        );
                        state_clone.hub.send(ReloadMessage::Reload { path });
                    }
                    Ok(None) => {}
                    Err(e) => tracing::error!("{}", e),
                }
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = router(state, &root);

        tracing::info!("Serving {} at http://{}", root.display(), addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

fn router(state: Arc<ServerState>, root: &Path) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route(RELOAD_WS_PATH, get(ws_handler))
        .route(RELOAD_SCRIPT_PATH, get(reload_script_handler))
        .fallback_service(ServeDir::new(root))
        .layer(middleware::from_fn(inject_reload_script))
        .with_state(state)
}

/// URL path of an output file relative to the served root.
fn url_path(root: &Path, output: &Path) -> Option<String> {
    let relative = output.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(format!("/{}", segments.join("/")))
}

/// Insert the live reload script before `</body>`, or append it.
fn inject_script(html: &str) -> String {
    let tag = format!(r#"<script src="{}"></script>"#, RELOAD_SCRIPT_PATH);
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}\n{}", &html[..pos], tag, &html[pos..]),
        None => format!("{}\n{}", html, tag),
    }
}

/// Middleware adding the live reload script to every HTML response.
async fn inject_reload_script(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    if !is_html || !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read response body: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(html))
}

/// Handler listing every document under the root.
async fn index_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let config = state.converter.config();

    let items = match discover(&config.root, &config.discover) {
        Ok(discovery) => discovery
            .docs
            .iter()
            .map(|doc| {
                let name = escape_html(&doc.relative_path.display().to_string());
                match url_path(&config.root, &doc.output_path) {
                    Some(href) if doc.output_path.is_file() => {
                        format!(r#"<li><a href="{}">{}</a></li>"#, escape_html(&href), name)
                    }
                    _ => format!("<li>{} <em>(not rendered)</em></li>", name),
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => format!("<li>{}</li>", escape_html(&e.to_string())),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>mdbake preview</title>
  <style>
    body {{ font-family: system-ui, sans-serif; max-width: 800px; margin: 2rem auto; padding: 0 1rem; }}
    li {{ margin: 0.25rem 0; }}
  </style>
</head>
<body>
  <h1>Documents</h1>
  <ul>
{}
  </ul>
</body>
</html>"#,
        items
    ))
}

/// Handler for the live reload websocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward reload messages to one websocket client.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();

    if send_json(&mut socket, &ReloadMessage::Connected).await.is_err() {
        return;
    }

    while let Ok(msg) = rx.recv().await {
        if send_json(&mut socket, &msg).await.is_err() {
            break;
        }
    }
}

async fn send_json(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

/// Handler for the live reload client script.
async fn reload_script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        reload_client_script(RELOAD_WS_PATH),
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use mdbake_render::{BatchConfig, BuiltinRenderer};
    use std::fs;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn test_router(root: &Path) -> Router {
        let converter = BatchConverter::new(
            BatchConfig {
                root: root.to_path_buf(),
                jobs: 1,
                ..Default::default()
            },
            Arc::new(BuiltinRenderer::new(None, false)),
        );
        let state = Arc::new(ServerState {
            converter: Arc::new(converter),
            hub: ReloadHub::new(),
        });
        router(state, root)
    }

    async fn get_body(router: &Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn default_config_listens_locally() {
        let config = PreviewConfig::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn injects_before_body_end() {
        let html = inject_script("<html><body><p>x</p></body></html>");

        assert_eq!(
            html,
            "<html><body><p>x</p><script src=\"/__reload.js\"></script>\n</body></html>"
        );
    }

    #[test]
    fn appends_when_body_end_is_missing() {
        let html = inject_script("<p>fragment</p>");
        assert!(html.ends_with("<script src=\"/__reload.js\"></script>"));
    }

    #[test]
    fn maps_outputs_to_url_paths() {
        let root = PathBuf::from("/notes");

        assert_eq!(
            url_path(&root, Path::new("/notes/a/one.html")),
            Some("/a/one.html".to_string())
        );
        assert_eq!(url_path(&root, Path::new("/elsewhere/x.html")), None);
    }

    #[test]
    fn escapes_listing_entries() {
        assert_eq!(escape_html("<a & \"b\">"), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[tokio::test]
    async fn serves_documents_with_reload_script() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("a.md"), "# A\n").unwrap();
        fs::write(root.join("draft.md"), "# Draft\n").unwrap();
        fs::write(root.join("a.html"), "<html><body><p>a</p></body></html>").unwrap();
        fs::write(root.join("a.css"), "body { margin: 0; }").unwrap();
        let router = test_router(root);

        let (status, html) = get_body(&router, "/a.html").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<p>a</p><script src=\"/__reload.js\"></script>\n</body>"));

        let (status, css) = get_body(&router, "/a.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(css, "body { margin: 0; }");

        let (status, index) = get_body(&router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(index.contains(r#"<li><a href="/a.html">a.md</a></li>"#));
        assert!(index.contains("<li>draft.md <em>(not rendered)</em></li>"));
        assert!(index.contains("<script src=\"/__reload.js\"></script>"));

        let (status, script) = get_body(&router, RELOAD_SCRIPT_PATH).await;
        assert_eq!(status, StatusCode::OK);
        assert!(script.contains(RELOAD_WS_PATH));
    }

    #[tokio::test]
    async fn does_not_serve_outside_the_root() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("notes");
        fs::create_dir_all(&root).unwrap();
        fs::write(temp.path().join("secret.html"), "<p>secret</p>").unwrap();
        let router = test_router(&root);

        let (status, body) = get_body(&router, "/../secret.html").await;

        assert_ne!(status, StatusCode::OK);
        assert!(!body.contains("secret"));
    }
}
