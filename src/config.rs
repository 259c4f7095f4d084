//! Service configuration
//!
//! The tracking directory comes from the `PREDECIR_TRACKING_DIR`
//! environment variable, falling back to a relative default. Candidate
//! model locations are taken from the CLI, or default to the conventional
//! drop locations under the tracking root.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::resolve::CandidateLocation;

/// Environment variable selecting the tracking directory
pub const TRACKING_DIR_ENV: &str = "PREDECIR_TRACKING_DIR";

/// Fallback tracking directory when the environment variable is unset
pub const DEFAULT_TRACKING_DIR: &str = "./mlruns";

/// Registered model name tried by default
pub const DEFAULT_MODEL_NAME: &str = "demo_classifier";

/// Registered model version tried by default
pub const DEFAULT_MODEL_VERSION: &str = "1";

/// Run identifier tried as the last default fallback
pub const DEFAULT_RUN_ID: &str = "3b9f2a74c1e04d5a8b6c7d8e9f0a1b2c";

/// Tracking directory from the environment, or the relative default
#[must_use]
pub fn tracking_dir_from_env() -> PathBuf {
    std::env::var(TRACKING_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_TRACKING_DIR))
}

/// Default ordered candidate list for a tracking root
///
/// Direct artifact path first, then the registry reference, then the run
/// reference as a last resort.
#[must_use]
pub fn default_candidates(tracking_dir: &Path) -> Vec<CandidateLocation> {
    vec![
        CandidateLocation::Artifact(tracking_dir.join("model")),
        CandidateLocation::Registry {
            name: DEFAULT_MODEL_NAME.to_string(),
            version: DEFAULT_MODEL_VERSION.to_string(),
        },
        CandidateLocation::Run {
            run_id: DEFAULT_RUN_ID.to_string(),
        },
    ]
}

/// Everything the serve command needs, resolved from CLI and environment
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Model-tracking root directory
    pub tracking_dir: PathBuf,
    /// Ordered candidate model locations, read-only after construction
    pub candidates: Vec<CandidateLocation>,
    /// CSV prediction log path
    pub log_path: PathBuf,
}

impl ServeConfig {
    /// Build the config from CLI arguments
    ///
    /// An explicit `--tracking-dir` overrides the environment; explicit
    /// `--candidate` locators replace the default list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if any locator is malformed.
    pub fn new(
        host: String,
        port: u16,
        tracking_dir: Option<PathBuf>,
        locators: &[String],
        log_path: PathBuf,
    ) -> Result<Self> {
        let tracking_dir = tracking_dir.unwrap_or_else(tracking_dir_from_env);
        let candidates = if locators.is_empty() {
            default_candidates(&tracking_dir)
        } else {
            locators
                .iter()
                .map(|l| CandidateLocation::parse(l))
                .collect::<Result<Vec<_>>>()?
        };
        Ok(Self {
            host,
            port,
            tracking_dir,
            candidates,
            log_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidates_order() {
        let candidates = default_candidates(Path::new("/app/mlruns"));
        assert_eq!(candidates.len(), 3);
        assert_eq!(
            candidates[0],
            CandidateLocation::Artifact(PathBuf::from("/app/mlruns/model"))
        );
        assert_eq!(candidates[1].to_string(), "models:/demo_classifier/1");
        assert_eq!(
            candidates[2].to_string(),
            format!("runs:/{DEFAULT_RUN_ID}/model")
        );
    }

    #[test]
    fn test_explicit_locators_replace_defaults() {
        let config = ServeConfig::new(
            "127.0.0.1".to_string(),
            5000,
            Some(PathBuf::from("/tmp/mlruns")),
            &["runs:/abc123/model".to_string()],
            PathBuf::from("logs/predictions.csv"),
        )
        .expect("config");
        assert_eq!(config.candidates.len(), 1);
        assert_eq!(config.candidates[0].to_string(), "runs:/abc123/model");
    }

    #[test]
    fn test_malformed_locator_rejected() {
        let err = ServeConfig::new(
            "127.0.0.1".to_string(),
            5000,
            Some(PathBuf::from("/tmp/mlruns")),
            &["models:/no-version".to_string()],
            PathBuf::from("logs/predictions.csv"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }
}
