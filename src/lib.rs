//! # Predecir
//!
//! A small demonstration prediction service with its companion maintenance
//! tool:
//!
//! - **Prediction service**: a form-based UI collecting ten numeric feature
//!   values, fed to a pre-trained binary classifier resolved at startup
//!   from an ordered list of candidate locations (direct path, registry
//!   reference, run reference). Predictions are rendered back with an
//!   optional probability and appended to a CSV log.
//! - **Path normalizer**: rewrites Windows-absolute artifact paths inside
//!   model-tracking metadata files so a model trained on one machine loads
//!   inside a Linux container.
//!
//! ## Example
//!
//! ```rust,ignore
//! use predecir::{
//!     api::{create_router, AppState},
//!     features::default_features,
//!     record::PredictionLog,
//!     resolve::Resolver,
//! };
//!
//! let resolver = Resolver::new("./mlruns");
//! let model = resolver.resolve(&candidates);
//! let state = AppState::new(model, default_features(), PredictionLog::new("logs/predictions.csv"));
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```
//!
//! No error here is fatal to a running service: a missing model degrades
//! to per-request "model unavailable" responses, and logging or
//! probability-extraction failures are swallowed.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)] // header sizes fit in u32
#![allow(clippy::cast_precision_loss)] // usize -> f32 in tests is fine
#![allow(clippy::cast_possible_wrap)] // class index -> i64 label

/// HTTP surface: router, handlers, and shared state
pub mod api;
/// Tracking directory and candidate-list configuration
pub mod config;
/// Crate-wide error type and result alias
pub mod error;
/// Feature descriptors and form parsing
pub mod features;
/// Classifier artifact format and model handle
pub mod model;
/// Windows-path rewriting for tracking metadata
pub mod normalize;
/// Append-only CSV prediction log
pub mod record;
/// Ordered-fallback model resolution
pub mod resolve;

pub use error::{PredecirError, Result};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
