//! Predecir CLI - classifier demo service and metadata path fixer
//!
//! # Commands
//!
//! - `serve` - Start the prediction web service
//! - `fix-paths` - Rewrite Windows-absolute mlruns paths in metadata files
//! - `info` - Show version info

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use predecir::{
    api::{create_router, AppState},
    config::ServeConfig,
    error::{PredecirError, Result},
    features, normalize,
    record::{self, PredictionLog},
    resolve::Resolver,
};

/// Predecir - classifier demo service
#[derive(Parser)]
#[command(name = "predecir")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the prediction web service
    ///
    /// Examples:
    ///   predecir serve
    ///   predecir serve --candidate ./mlruns/model --candidate models:/demo_classifier/1
    Serve {
        /// Bind host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Bind port
        #[arg(long, default_value = "5000")]
        port: u16,

        /// Model-tracking directory (overrides PREDECIR_TRACKING_DIR)
        #[arg(long)]
        tracking_dir: Option<PathBuf>,

        /// Candidate model locator, tried in order: a path,
        /// models:/<name>/<version>, or runs:/<run_id>/model
        #[arg(long = "candidate", value_name = "LOCATOR")]
        candidates: Vec<String>,

        /// CSV file receiving one row per prediction
        #[arg(long, default_value = record::DEFAULT_LOG_PATH)]
        log_path: PathBuf,
    },
    /// Rewrite Windows-absolute mlruns paths in tracking metadata
    ///
    /// Examples:
    ///   predecir fix-paths /app/mlruns
    ///   predecir fix-paths ./mlruns --target /app/mlruns
    FixPaths {
        /// Root directory to scan
        #[arg(value_name = "ROOT", default_value = "/app/mlruns")]
        root: PathBuf,

        /// Replacement base path
        #[arg(long, default_value = normalize::TARGET_BASE)]
        target: String,
    },
    /// Show version and configuration info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            tracking_dir,
            candidates,
            log_path,
        } => {
            let config = ServeConfig::new(host, port, tracking_dir, &candidates, log_path)?;
            serve(config).await?;
        }
        Commands::FixPaths { root, target } => {
            println!("[INFO] Fixing Windows paths in: {}", root.display());
            let fixed = normalize::fix_windows_paths(&root, &target);
            println!("[OK] Fixed {fixed} files");
            if fixed == 0 && !root.exists() {
                std::process::exit(1);
            }
        }
        Commands::Info => {
            println!("Predecir v{}", predecir::VERSION);
            println!("Classifier demo service");
            println!();
            println!("Features:");
            println!("  - Form-based prediction UI (ten numeric features)");
            println!("  - Ordered-fallback model resolution (path, registry, run)");
            println!("  - CSV prediction log");
            println!("  - mlruns metadata path fixing");
        }
    }

    Ok(())
}

async fn serve(config: ServeConfig) -> Result<()> {
    println!("Starting Predecir prediction service...");
    println!("Tracking directory: {}", config.tracking_dir.display());

    let resolver = Resolver::new(config.tracking_dir.clone());
    let model = resolver.resolve(&config.candidates);
    if model.is_none() {
        println!("No model available; serving in degraded mode.");
    }

    let state = AppState::new(
        model,
        features::default_features(),
        PredictionLog::new(config.log_path.clone()),
    );
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| PredecirError::InvalidConfiguration(format!("invalid address: {e}")))?;

    println!("Server listening on http://{addr}");
    println!();
    println!("Endpoints:");
    println!("  GET  /        - Prediction form");
    println!("  POST /        - Submit a prediction");
    println!("  GET  /health  - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PredecirError::IoError {
            message: format!("failed to bind {addr}: {e}"),
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| PredecirError::IoError {
            message: format!("server error: {e}"),
        })
}
