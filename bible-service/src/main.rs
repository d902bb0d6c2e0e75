mod envelope;
mod error;
mod logging;
mod params;
mod routes;
mod state;

use axum::handler::HandlerWithoutStateExt;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{middleware, Router};
use bible_core::{discover_project_root, Config};
use clap::Parser;
use envelope::pretty_json;
use error::ErrorEnvelope;
use state::{AppState, SharedState};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Parser, Debug)]
#[command(name = "bible-service")]
#[command(about = "Read-only JSON API over per-chapter Bible text files")]
struct Args {
    /// Port to listen on (falls back to bible.toml, then 3000)
    #[arg(long, env = "BIBLE_PORT")]
    port: Option<u16>,

    /// Address to bind (falls back to bible.toml, then 127.0.0.1)
    #[arg(long, env = "BIBLE_BIND")]
    bind: Option<String>,

    /// Project root; discovered from the working directory when omitted
    #[arg(long)]
    root: Option<PathBuf>,

    /// Log filter (e.g. "info", "bible_service=debug")
    #[arg(long, env = "BIBLE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let root = match args.root {
        Some(root) => root,
        None => {
            let defaults = Config::default();
            let cwd = std::env::current_dir()?;
            discover_project_root(&cwd, &defaults.paths, defaults.discovery.max_steps)
        }
    };
    let config = Config::load_from_root(&root)?;

    let port = args.port.unwrap_or(config.server.port);
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let state: SharedState = Arc::new(AppState::new(&root, config));
    tracing::info!(
        root = %state.root.display(),
        chapters = %state.queries.index().dir().display(),
        public = %state.public_dir.display(),
        "project root resolved"
    );

    let app = router(state);

    let addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("bible-service listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn router(state: SharedState) -> Router {
    let static_files = ServeDir::new(&state.public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(routes::not_found.into_service());

    let app = Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/books", get(routes::books))
        .route("/api/book/chapters", get(routes::book_chapters))
        .route("/api/book/meta", get(routes::book_meta))
        .route("/api/chapter", get(routes::chapter))
        .route("/api/chapter/verses", get(routes::chapter_verses))
        .route("/api/verse/random", get(routes::random_verse))
        .route("/api/search", get(routes::search))
        .route("/api/files", get(routes::files))
        .route("/api/stats", get(routes::stats))
        .route("/api/range", get(routes::range))
        .route("/api/verse", get(routes::verse))
        .route("/api/{*rest}", get(routes::not_found))
        .fallback_service(static_files)
        .with_state(state);
    layered(app)
}

/// Panic catch-all, request log line and tracing, outermost last
fn layered(app: Router) -> Router {
    app.layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(logging::log_requests))
        .layer(TraceLayer::new_for_http())
}

/// Any fault escaping a handler becomes a 500 envelope
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%message, "handler panicked");
    pretty_json(StatusCode::INTERNAL_SERVER_ERROR, &ErrorEnvelope::new(message))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
