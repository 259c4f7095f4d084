//! Classifier artifact format and model handle
//!
//! Models are stored in a small binary artifact (`.prd`):
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ Header (16 bytes)                                  │
//! │   - Magic: "PRD1" (4 bytes)                        │
//! │   - Format version (2 bytes LE)                    │
//! │   - Flags (2 bytes LE, reserved)                   │
//! │   - Feature count (4 bytes LE)                     │
//! │   - Metadata size (4 bytes LE)                     │
//! ├────────────────────────────────────────────────────┤
//! │ JSON metadata                                      │
//! ├────────────────────────────────────────────────────┤
//! │ Weights (feature count × f32 LE) + bias (f32 LE)   │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! The stored model is a binary linear classifier. [`ModelHandle`] wraps a
//! loaded model together with the locator it was resolved from, and exposes
//! the optional probability capability: direct when the artifact metadata
//! advertises it, otherwise reconstructed from the raw decision score, with
//! any failure collapsing to `None`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PredecirError, Result};

/// Magic number: "PRD1"
pub const MAGIC: [u8; 4] = [0x50, 0x52, 0x44, 0x31];

/// Header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Current artifact format version
pub const FORMAT_VERSION: u16 = 1;

/// Metadata block embedded in the artifact
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Model type (e.g., "logistic_regression")
    #[serde(default)]
    pub model_type: Option<String>,
    /// Human-readable model name
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the model exposes a direct probability query
    #[serde(default)]
    pub has_probability: bool,
    /// Class labels; index 0 is the negative class, index 1 the positive
    #[serde(default)]
    pub classes: Option<Vec<i64>>,
}

/// Binary linear classifier loaded from a `.prd` artifact
#[derive(Debug, Clone)]
pub struct ClassifierModel {
    /// Per-feature weights
    pub weights: Vec<f32>,
    /// Bias term
    pub bias: f32,
    /// Artifact metadata
    pub metadata: ArtifactMetadata,
}

impl ClassifierModel {
    /// Load a model from a `.prd` artifact file
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read, `FormatError` if the
    /// header, metadata, or weight section is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref()).map_err(|e| PredecirError::IoError {
            message: format!("Failed to read artifact {}: {e}", path.as_ref().display()),
        })?;
        Self::from_bytes(&data)
    }

    /// Parse a model from raw artifact bytes
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if any section is malformed or truncated.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(PredecirError::FormatError {
                reason: format!("Artifact too short: {} bytes", data.len()),
            });
        }

        let magic: [u8; 4] = data[0..4]
            .try_into()
            .map_err(|_| PredecirError::FormatError {
                reason: "Failed to read magic bytes".to_string(),
            })?;
        if magic != MAGIC {
            return Err(PredecirError::FormatError {
                reason: format!("Invalid artifact magic: expected {MAGIC:?}, got {magic:?}"),
            });
        }

        let version = u16::from_le_bytes([data[4], data[5]]);
        if version != FORMAT_VERSION {
            return Err(PredecirError::FormatError {
                reason: format!("Unsupported format version: {version}"),
            });
        }

        // data[6..8] is the reserved flags field
        let n_features = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;
        let metadata_size = u32::from_le_bytes([data[12], data[13], data[14], data[15]]) as usize;

        let weights_offset = HEADER_SIZE + metadata_size;
        let expected_len = weights_offset + (n_features + 1) * 4;
        if data.len() < expected_len {
            return Err(PredecirError::FormatError {
                reason: format!(
                    "Artifact truncated: expected {expected_len} bytes, got {}",
                    data.len()
                ),
            });
        }

        let metadata: ArtifactMetadata = serde_json::from_slice(&data[HEADER_SIZE..weights_offset])
            .map_err(|e| PredecirError::FormatError {
                reason: format!("Invalid artifact metadata: {e}"),
            })?;

        let mut weights = Vec::with_capacity(n_features);
        let mut pos = weights_offset;
        for _ in 0..n_features {
            weights.push(f32::from_le_bytes([
                data[pos],
                data[pos + 1],
                data[pos + 2],
                data[pos + 3],
            ]));
            pos += 4;
        }
        let bias = f32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);

        Ok(Self {
            weights,
            bias,
            metadata,
        })
    }

    /// Serialize the model to artifact bytes
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if the metadata cannot be serialized.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let metadata = serde_json::to_vec(&self.metadata).map_err(|e| {
            PredecirError::FormatError {
                reason: format!("Failed to serialize metadata: {e}"),
            }
        })?;

        let mut data = Vec::with_capacity(HEADER_SIZE + metadata.len() + (self.weights.len() + 1) * 4);
        data.extend_from_slice(&MAGIC);
        data.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&u32::try_from(self.weights.len()).unwrap_or(u32::MAX).to_le_bytes());
        data.extend_from_slice(&u32::try_from(metadata.len()).unwrap_or(u32::MAX).to_le_bytes());
        data.extend_from_slice(&metadata);
        for w in &self.weights {
            data.extend_from_slice(&w.to_le_bytes());
        }
        data.extend_from_slice(&self.bias.to_le_bytes());
        Ok(data)
    }

    /// Write the model to a `.prd` artifact file
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = self.to_bytes()?;
        fs::write(path.as_ref(), data).map_err(|e| PredecirError::IoError {
            message: format!("Failed to write artifact {}: {e}", path.as_ref().display()),
        })
    }

    /// Raw decision score: `weights · features + bias`
    ///
    /// # Errors
    ///
    /// Returns `InferenceError` on a feature-count mismatch.
    pub fn decision_score(&self, features: &[f32]) -> Result<f32> {
        if features.len() != self.weights.len() {
            return Err(PredecirError::InferenceError(format!(
                "Expected {} features, got {}",
                self.weights.len(),
                features.len()
            )));
        }
        let dot: f32 = self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum();
        Ok(dot + self.bias)
    }

    /// Predict the class label for one feature vector
    ///
    /// # Errors
    ///
    /// Returns `InferenceError` on a feature-count mismatch.
    pub fn predict(&self, features: &[f32]) -> Result<i64> {
        let score = self.decision_score(features)?;
        let index = usize::from(score > 0.0);
        let label = match &self.metadata.classes {
            Some(classes) if classes.len() == 2 => classes[index],
            _ => index as i64,
        };
        Ok(label)
    }

    /// Probability of the positive class
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the artifact metadata does not
    /// advertise the probability capability, or `InferenceError` on a
    /// feature-count mismatch.
    pub fn predict_proba(&self, features: &[f32]) -> Result<f32> {
        if !self.metadata.has_probability {
            return Err(PredecirError::UnsupportedOperation {
                operation: "predict_proba".to_string(),
            });
        }
        Ok(sigmoid(self.decision_score(features)?))
    }
}

/// A resolved, ready-to-invoke model
///
/// Created at most once per process start by the resolver; immutable and
/// shared read-only across request handlers thereafter.
#[derive(Debug)]
pub struct ModelHandle {
    model: ClassifierModel,
    source: String,
}

impl ModelHandle {
    /// Wrap a loaded model with the locator it was resolved from
    #[must_use]
    pub fn new(model: ClassifierModel, source: impl Into<String>) -> Self {
        Self {
            model,
            source: source.into(),
        }
    }

    /// Locator this handle was loaded from, for logs
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Predict the class label for one feature vector
    ///
    /// # Errors
    ///
    /// Returns `InferenceError` on a feature-count mismatch.
    pub fn predict(&self, features: &[f32]) -> Result<i64> {
        self.model.predict(features)
    }

    /// Probability of the positive class, if obtainable
    ///
    /// Prefers the model's direct probability query; falls back to the raw
    /// decision score of the underlying linear model. Failures in either
    /// path collapse to `None`.
    #[must_use]
    pub fn probability(&self, features: &[f32]) -> Option<f32> {
        match self.model.predict_proba(features) {
            Ok(p) => Some(p),
            Err(_) => self.model.decision_score(features).ok().map(sigmoid),
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
