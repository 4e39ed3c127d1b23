//! CV Redaction Server
//!
//! Accepts a CV as a PDF upload and returns a copy whose first page has the
//! candidate's contact details and profile photo removed.
//!
//! - `GET /health` - liveness check
//! - `POST /redact` - multipart upload, field `file`
//!
//! Redaction is CPU-bound and runs on the blocking thread pool. The detectors
//! refuse to act on weak evidence, so a rejected document comes back as an
//! error rather than a partially redacted file.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use cv_redact_core::{LopdfEngine, RedactionConfig, Redactor};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_health, handle_redact};

/// Command-line arguments for the redaction server
#[derive(Parser, Debug)]
#[command(name = "cv-redact-server")]
#[command(about = "Redacts contact details and photos from CV uploads")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// JSON file overriding detection thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum upload size in megabytes
    #[arg(long, default_value = "20")]
    max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub redactor: Arc<Redactor<LopdfEngine>>,
}

impl AppState {
    pub fn new(config: RedactionConfig) -> Self {
        Self {
            redactor: Arc::new(Redactor::with_config(LopdfEngine, config)),
        }
    }
}

/// Build the router with all routes and middleware
pub fn build_app(state: AppState, max_upload_bytes: usize) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/redact", post(handle_redact))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &args.config {
        Some(path) => {
            info!("Loading detection thresholds from {}", path.display());
            RedactionConfig::from_json_file(path)?
        }
        None => RedactionConfig::default(),
    };

    let state = AppState::new(config);
    let app = build_app(state, args.max_upload_mb * 1024 * 1024);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Upload limit: {} MB", args.max_upload_mb);

    axum::serve(listener, app).await?;

    Ok(())
}
