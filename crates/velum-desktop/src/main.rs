//! velum-desktop: the desktop shell's local HTTP server.
//!
//! Serves the built web UI from a directory on 127.0.0.1 at a random
//! port in the dynamic range, the address a webview (or a browser,
//! during development) is pointed at. No vault state lives here; the UI
//! talks to vaults through its own channel.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use clap::Parser;
use rand::Rng;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

const DYN_PORT_MIN: u16 = 49152;
const DYN_PORT_MAX: u16 = 65535;
const BIND_ATTEMPTS: usize = 32;

#[derive(Parser, Debug)]
#[command(name = "velum-desktop", version, about = "velum desktop shell")]
struct Cli {
    /// Directory holding the built web UI
    #[arg(long, env = "VELUM_UI_DIR", default_value = "ui")]
    ui: PathBuf,

    /// Serve index.dev.html as the entry page
    #[arg(long, env = "VELUM_DEV_MODE")]
    dev: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VELUM_LOG", default_value = "info")]
    log: String,
}

struct UiState {
    dir: PathBuf,
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let state = Arc::new(UiState {
        dir: cli.ui.clone(),
        dev: cli.dev,
    });
    let app = Router::new().fallback(serve_ui).with_state(state);

    let listener = bind_dynamic_port().await?;
    let addr = listener.local_addr()?;
    info!(%addr, ui = %cli.ui.display(), dev = cli.dev, "serving UI at http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Bind 127.0.0.1 on a random port in the dynamic range, retrying on
/// collisions with other local services.
async fn bind_dynamic_port() -> Result<TcpListener> {
    for _ in 0..BIND_ATTEMPTS {
        let port = rand::thread_rng().gen_range(DYN_PORT_MIN..=DYN_PORT_MAX);
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                debug!(port, "port in use, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
    anyhow::bail!("no free port found in the dynamic range after {BIND_ATTEMPTS} attempts")
}

async fn serve_ui(State(state): State<Arc<UiState>>, uri: Uri) -> impl IntoResponse {
    let rel = uri.path().trim_start_matches('/');
    let rel = if rel.is_empty() {
        if state.dev {
            "index.dev.html"
        } else {
            "index.html"
        }
    } else {
        rel
    };

    let Some(path) = resolve(&state.dir, rel) else {
        warn!(path = rel, "rejected UI path");
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(body) => {
            debug!(path = %path.display(), bytes = body.len(), "served");
            ([(header::CONTENT_TYPE, content_type(&path))], body).into_response()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "UI file unavailable");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Join a request path onto the UI directory, refusing anything but
/// plain downward components.
fn resolve(dir: &Path, rel: &str) -> Option<PathBuf> {
    let rel = Path::new(rel);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(dir.join(rel))
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rejects_escapes() {
        let dir = Path::new("/srv/ui");
        assert!(resolve(dir, "../secret").is_none());
        assert!(resolve(dir, "a/../../b").is_none());
        assert!(resolve(dir, "/etc/passwd").is_none());
        assert_eq!(
            resolve(dir, "assets/app.js"),
            Some(PathBuf::from("/srv/ui/assets/app.js"))
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(
            content_type(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(content_type(Path::new("app.js")), "text/javascript");
        assert_eq!(content_type(Path::new("blob.bin")), "application/octet-stream");
    }
}
