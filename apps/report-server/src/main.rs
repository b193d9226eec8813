//! Transformer Maintenance Report Server
//!
//! Renders maintenance report PDFs from the maintenance backend's data.
//!
//! - `serve` exposes report generation, draft storage and submission over HTTP
//! - `generate` writes a single report to disk
//!
//! Configuration comes from flags, environment variables and an optional
//! `.env` file, in that order of precedence.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use report_core::{ComposeOptions, ReportComposer};
use report_data::config::{DEFAULT_BASE_URL, DEFAULT_IMAGE_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS};
use report_data::{
    Aggregator, DataService, HttpDataService, InMemoryDataService, RecordSelection,
    ReportGenerator, ServiceConfig,
};
use shared_types::{MaintenanceDraft, RasterImage, Signature, Signatures};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

/// Command-line arguments for the report server
#[derive(Parser, Debug)]
#[command(name = "report-server")]
#[command(about = "Transformer maintenance report server")]
struct Args {
    /// Root URL of the maintenance backend
    #[arg(long, env = "REPORT_API_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    api_base_url: String,

    /// How long to wait for an inspection image before printing a placeholder
    #[arg(long, env = "REPORT_IMAGE_TIMEOUT_MS", default_value_t = DEFAULT_IMAGE_TIMEOUT_MS, global = true)]
    image_timeout_ms: u64,

    /// Upper bound for any single backend request
    #[arg(long, env = "REPORT_REQUEST_TIMEOUT_MS", default_value_t = DEFAULT_REQUEST_TIMEOUT_MS, global = true)]
    request_timeout_ms: u64,

    /// Use the built-in sample data instead of the backend
    #[arg(long, global = true)]
    fixture: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Host address to bind to
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,
    },

    /// Write one report PDF to a directory
    Generate {
        /// Transformer number
        transformer: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Form values to print: `blank`, `latest` or a record id
        #[arg(long, default_value = "latest")]
        record: RecordSelection,

        /// PNG of the technician's signature
        #[arg(long)]
        technician_signature: Option<PathBuf>,

        /// PNG of the supervisor's signature
        #[arg(long)]
        supervisor_signature: Option<PathBuf>,
    },
}

impl Args {
    fn service_config(&self) -> ServiceConfig {
        ServiceConfig::new(self.api_base_url.clone())
            .with_request_timeout(Duration::from_millis(self.request_timeout_ms))
            .with_image_timeout(Duration::from_millis(self.image_timeout_ms))
    }

    fn data_service(&self, config: &ServiceConfig) -> anyhow::Result<Arc<dyn DataService>> {
        if self.fixture {
            info!("Using built-in sample data");
            return Ok(Arc::new(InMemoryDataService::sample()));
        }
        let service = HttpDataService::new(config).context("Failed to create data service")?;
        Ok(Arc::new(service))
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn DataService>,
    pub aggregator: Aggregator,
    /// Unsubmitted drafts keyed by transformer number
    pub drafts: Arc<RwLock<HashMap<String, MaintenanceDraft>>>,
}

impl AppState {
    pub fn new(service: Arc<dyn DataService>, config: &ServiceConfig) -> Self {
        Self {
            aggregator: Aggregator::new(Arc::clone(&service), config),
            service,
            drafts: Arc::default(),
        }
    }

    /// Generator dated today
    pub fn generator(&self) -> ReportGenerator {
        ReportGenerator::new(
            self.aggregator.clone(),
            ReportComposer::new(ComposeOptions::default()),
        )
    }

    pub async fn draft(&self, transformer_id: &str) -> Option<MaintenanceDraft> {
        self.drafts.read().await.get(transformer_id).cloned()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
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

    let config = args.service_config();
    let service = args.data_service(&config)?;

    match &args.command {
        Command::Serve { port, host } => serve(host, *port, AppState::new(service, &config)).await,
        Command::Generate {
            transformer,
            out,
            record,
            technician_signature,
            supervisor_signature,
        } => {
            let signatures = Signatures {
                technician: load_signature(technician_signature.as_deref())?,
                supervisor: load_signature(supervisor_signature.as_deref())?,
            };
            let generator = ReportGenerator::new(
                Aggregator::new(service, &config),
                ReportComposer::default(),
            );
            let report = generator
                .generate(transformer, *record, None, &signatures)
                .await?;

            tokio::fs::create_dir_all(out)
                .await
                .with_context(|| format!("Failed to create {}", out.display()))?;
            let path = out.join(&report.filename);
            tokio::fs::write(&path, &report.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            info!("Wrote {} ({} page(s))", path.display(), report.page_count);
            Ok(())
        }
    }
}

async fn serve(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    info!("Starting report server on {}:{}", host, port);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn load_signature(path: Option<&Path>) -> anyhow::Result<Signature> {
    let Some(path) = path else {
        return Ok(Signature::blank());
    };
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read signature {}", path.display()))?;
    Ok(Signature::from_image(RasterImage::new(bytes)))
}
