//! Model resolution fallback chain
//!
//! At startup the service walks an ordered list of [`CandidateLocation`]s
//! and loads a model from the first one that works. Three locator shapes
//! are recognized:
//!
//! - a direct filesystem path to an artifact file or directory
//! - `models:/<name>/<version>` — a registry reference, resolved through
//!   the registered model's `meta.yaml` `storage_location` field
//! - `runs:/<run_id>/model` — a run reference, resolved by scanning the
//!   experiment directories under the tracking root
//!
//! Direct paths are existence-checked before a load is attempted. A failed
//! candidate logs a warning and falls through to the next; the first
//! success wins and no later candidate is tried. Exhausting the list is
//! not fatal: the service starts without a model and reports the absence
//! per request.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::error::{PredecirError, Result};
use crate::model::{ClassifierModel, ModelHandle};

/// Artifact file name inside a model directory
pub const ARTIFACT_FILENAME: &str = "model.prd";

/// One place a model might be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateLocation {
    /// Direct filesystem path to an artifact file or directory
    Artifact(PathBuf),
    /// Registry reference: `models:/<name>/<version>`
    Registry {
        /// Registered model name
        name: String,
        /// Registered model version
        version: String,
    },
    /// Run reference: `runs:/<run_id>/model`
    Run {
        /// Run identifier
        run_id: String,
    },
}

impl CandidateLocation {
    /// Parse a locator string, selecting the kind by its shape
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for a malformed `models:` or `runs:`
    /// reference. Anything without those prefixes is a filesystem path.
    pub fn parse(locator: &str) -> Result<Self> {
        if let Some(rest) = locator.strip_prefix("models:/") {
            let (name, version) = rest.split_once('/').ok_or_else(|| {
                PredecirError::InvalidConfiguration(format!(
                    "registry locator missing version: {locator}"
                ))
            })?;
            if name.is_empty() || version.is_empty() {
                return Err(PredecirError::InvalidConfiguration(format!(
                    "registry locator missing name or version: {locator}"
                )));
            }
            Ok(Self::Registry {
                name: name.to_string(),
                version: version.to_string(),
            })
        } else if let Some(rest) = locator.strip_prefix("runs:/") {
            let run_id = rest.split('/').next().unwrap_or("");
            if run_id.is_empty() {
                return Err(PredecirError::InvalidConfiguration(format!(
                    "run locator missing run id: {locator}"
                )));
            }
            Ok(Self::Run {
                run_id: run_id.to_string(),
            })
        } else {
            Ok(Self::Artifact(PathBuf::from(locator)))
        }
    }
}

impl fmt::Display for CandidateLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Artifact(path) => write!(f, "{}", path.display()),
            Self::Registry { name, version } => write!(f, "models:/{name}/{version}"),
            Self::Run { run_id } => write!(f, "runs:/{run_id}/model"),
        }
    }
}

/// Resolves a model handle from an ordered candidate list
#[derive(Debug, Clone)]
pub struct Resolver {
    tracking_root: PathBuf,
}

impl Resolver {
    /// Create a resolver rooted at the tracking directory
    #[must_use]
    pub fn new(tracking_root: impl Into<PathBuf>) -> Self {
        Self {
            tracking_root: tracking_root.into(),
        }
    }

    /// Try each candidate in order; first successful load wins
    ///
    /// Returns `None` if every candidate fails or is missing. The caller
    /// keeps serving in degraded mode in that case.
    #[must_use]
    pub fn resolve(&self, candidates: &[CandidateLocation]) -> Option<ModelHandle> {
        for candidate in candidates {
            if let CandidateLocation::Artifact(path) = candidate {
                if !path.exists() {
                    warn!(candidate = %candidate, "candidate path does not exist");
                    continue;
                }
            }
            match self.load(candidate) {
                Ok(handle) => {
                    info!(candidate = %candidate, "model loaded");
                    return Some(handle);
                }
                Err(err) => {
                    warn!(candidate = %candidate, error = %err, "failed to load model");
                }
            }
        }
        error!("no model could be loaded from any candidate location");
        None
    }

    fn load(&self, candidate: &CandidateLocation) -> Result<ModelHandle> {
        let artifact = match candidate {
            CandidateLocation::Artifact(path) => {
                if path.is_dir() {
                    path.join(ARTIFACT_FILENAME)
                } else {
                    path.clone()
                }
            }
            CandidateLocation::Registry { name, version } => {
                self.registry_artifact(name, version)?
            }
            CandidateLocation::Run { run_id } => self.run_artifact(run_id)?,
        };
        let model = ClassifierModel::load(&artifact)?;
        Ok(ModelHandle::new(model, candidate.to_string()))
    }

    /// Resolve a registry reference through its version metadata
    ///
    /// Reads `<root>/models/<name>/version-<version>/meta.yaml` and loads
    /// the artifact from its `storage_location`. This only works after the
    /// path normalizer has run in environments where the metadata was
    /// written on another machine.
    fn registry_artifact(&self, name: &str, version: &str) -> Result<PathBuf> {
        let meta = self
            .tracking_root
            .join("models")
            .join(name)
            .join(format!("version-{version}"))
            .join("meta.yaml");
        let text = fs::read_to_string(&meta).map_err(|e| {
            PredecirError::ModelNotFound(format!(
                "registry metadata {} unreadable: {e}",
                meta.display()
            ))
        })?;
        let storage = storage_location(&text).ok_or_else(|| {
            PredecirError::ModelNotFound(format!(
                "no storage_location in {}",
                meta.display()
            ))
        })?;
        let storage = storage.strip_prefix("file://").unwrap_or(storage);
        Ok(PathBuf::from(storage).join(ARTIFACT_FILENAME))
    }

    /// Resolve a run reference by scanning experiment directories
    fn run_artifact(&self, run_id: &str) -> Result<PathBuf> {
        // Run directories live two levels down: <root>/<experiment_id>/<run_id>
        for entry in WalkDir::new(&self.tracking_root)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(std::result::Result::ok)
        {
            if entry.file_type().is_dir() && entry.file_name() == OsStr::new(run_id) {
                return Ok(entry
                    .path()
                    .join("artifacts")
                    .join("model")
                    .join(ARTIFACT_FILENAME));
            }
        }
        Err(PredecirError::ModelNotFound(format!(
            "run {run_id} not found under {}",
            self.tracking_root.display()
        )))
    }
}

fn storage_location(text: &str) -> Option<&str> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix("storage_location:"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::model::{ArtifactMetadata, ClassifierModel};

    /// Shared buffer standing in for stderr so tests can assert log output
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().expect("lock").clone()).expect("utf8")
        }
    }

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn save_model(dir: &Path) -> PathBuf {
        std::fs::create_dir_all(dir).expect("mkdir");
        let model = ClassifierModel {
            weights: vec![1.0, 1.0],
            bias: 0.0,
            metadata: ArtifactMetadata::default(),
        };
        let path = dir.join(ARTIFACT_FILENAME);
        model.save(&path).expect("save");
        path
    }

    #[test]
    fn test_parse_registry_locator() {
        let c = CandidateLocation::parse("models:/demo_classifier/1").expect("parse");
        assert_eq!(
            c,
            CandidateLocation::Registry {
                name: "demo_classifier".to_string(),
                version: "1".to_string(),
            }
        );
        assert_eq!(c.to_string(), "models:/demo_classifier/1");
    }

    #[test]
    fn test_parse_run_locator() {
        let c = CandidateLocation::parse("runs:/545cfe034e9f/model").expect("parse");
        assert_eq!(
            c,
            CandidateLocation::Run {
                run_id: "545cfe034e9f".to_string(),
            }
        );
        assert_eq!(c.to_string(), "runs:/545cfe034e9f/model");
    }

    #[test]
    fn test_parse_path_locator() {
        let c = CandidateLocation::parse("./mlruns/model").expect("parse");
        assert_eq!(c, CandidateLocation::Artifact(PathBuf::from("./mlruns/model")));
    }

    #[test]
    fn test_parse_malformed_locators() {
        assert!(CandidateLocation::parse("models:/only-name").is_err());
        assert!(CandidateLocation::parse("models://1").is_err());
        assert!(CandidateLocation::parse("runs://model").is_err());
    }

    #[test]
    fn test_resolve_first_success_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A: path missing
        let missing = dir.path().join("absent");
        // B: path exists but holds garbage
        let corrupt = dir.path().join("corrupt.prd");
        std::fs::write(&corrupt, b"not an artifact").expect("write");
        // C: valid artifact
        let good_dir = dir.path().join("good");
        save_model(&good_dir);

        let resolver = Resolver::new(dir.path());
        let candidates = vec![
            CandidateLocation::Artifact(missing),
            CandidateLocation::Artifact(corrupt),
            CandidateLocation::Artifact(good_dir.clone()),
        ];
        let handle = resolver.resolve(&candidates).expect("resolved");
        assert_eq!(handle.source(), good_dir.display().to_string());
    }

    #[test]
    fn test_resolve_logs_two_warnings_then_one_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent");
        let corrupt = dir.path().join("corrupt.prd");
        std::fs::write(&corrupt, b"not an artifact").expect("write");
        let good_dir = dir.path().join("good");
        save_model(&good_dir);

        let resolver = Resolver::new(dir.path());
        let candidates = vec![
            CandidateLocation::Artifact(missing),
            CandidateLocation::Artifact(corrupt),
            CandidateLocation::Artifact(good_dir),
        ];

        let log = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let handle =
            tracing::subscriber::with_default(subscriber, || resolver.resolve(&candidates));
        assert!(handle.is_some());

        let output = log.contents();
        assert_eq!(output.matches("WARN").count(), 2);
        let missing_at = output.find("candidate path does not exist").expect("warn A");
        let failed_at = output.find("failed to load model").expect("warn B");
        let loaded_at = output.find("model loaded").expect("success C");
        assert!(missing_at < failed_at);
        assert!(failed_at < loaded_at);
        assert_eq!(output.matches("model loaded").count(), 1);
    }

    #[test]
    fn test_resolve_exhausted_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolver = Resolver::new(dir.path());
        let candidates = vec![
            CandidateLocation::Artifact(dir.path().join("absent")),
            CandidateLocation::Run {
                run_id: "nope".to_string(),
            },
        ];
        assert!(resolver.resolve(&candidates).is_none());
    }

    #[test]
    fn test_resolve_registry_via_storage_location() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = dir.path().join("storage");
        save_model(&storage);
        let version_dir = dir.path().join("models/demo/version-1");
        std::fs::create_dir_all(&version_dir).expect("mkdir");
        std::fs::write(
            version_dir.join("meta.yaml"),
            format!("name: demo\nversion: 1\nstorage_location: {}\n", storage.display()),
        )
        .expect("write");

        let resolver = Resolver::new(dir.path());
        let candidates = vec![CandidateLocation::Registry {
            name: "demo".to_string(),
            version: "1".to_string(),
        }];
        let handle = resolver.resolve(&candidates).expect("resolved");
        assert_eq!(handle.source(), "models:/demo/1");
    }

    #[test]
    fn test_resolve_run_by_scan() {
        let dir = tempfile::tempdir().expect("tempdir");
        let model_dir = dir.path().join("602464/run42/artifacts/model");
        save_model(&model_dir);

        let resolver = Resolver::new(dir.path());
        let candidates = vec![CandidateLocation::Run {
            run_id: "run42".to_string(),
        }];
        let handle = resolver.resolve(&candidates).expect("resolved");
        assert_eq!(handle.source(), "runs:/run42/model");
    }

    #[test]
    fn test_storage_location_parsing() {
        assert_eq!(
            storage_location("name: x\nstorage_location: /app/mlruns/models\n"),
            Some("/app/mlruns/models")
        );
        assert_eq!(storage_location("name: x\n"), None);
        assert_eq!(storage_location("storage_location:\n"), None);
    }
}
