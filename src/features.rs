//! Feature descriptors and form parsing
//!
//! The model takes a fixed, ordered vector of ten numeric features. Each
//! feature has a form key, a display label, and an example hint used when
//! rendering the input form. Parsing is all-or-nothing: one missing or
//! non-numeric field fails the whole submission.

use std::collections::HashMap;

use crate::error::{PredecirError, Result};

/// Number of input features
pub const FEATURE_COUNT: usize = 10;

/// One input feature: form key, display label, and example hint
#[derive(Debug, Clone)]
pub struct FeatureSpec {
    /// Form field name
    pub key: &'static str,
    /// Label shown next to the input
    pub label: &'static str,
    /// Placeholder hint shown inside the input
    pub hint: &'static str,
}

/// The canonical ordered feature list
#[must_use]
pub fn default_features() -> Vec<FeatureSpec> {
    vec![
        FeatureSpec {
            key: "f1",
            label: "Feature 1",
            hint: "e.g. measurement A",
        },
        FeatureSpec {
            key: "f2",
            label: "Feature 2",
            hint: "e.g. measurement B",
        },
        FeatureSpec {
            key: "f3",
            label: "Feature 3",
            hint: "e.g. measurement C",
        },
        FeatureSpec {
            key: "f4",
            label: "Feature 4",
            hint: "e.g. ratio or percentage",
        },
        FeatureSpec {
            key: "f5",
            label: "Feature 5",
            hint: "e.g. composite index",
        },
        FeatureSpec {
            key: "f6",
            label: "Feature 6",
            hint: "e.g. object count",
        },
        FeatureSpec {
            key: "f7",
            label: "Feature 7",
            hint: "e.g. duration in seconds",
        },
        FeatureSpec {
            key: "f8",
            label: "Feature 8",
            hint: "e.g. temperature or voltage",
        },
        FeatureSpec {
            key: "f9",
            label: "Feature 9",
            hint: "e.g. distance or length",
        },
        FeatureSpec {
            key: "f10",
            label: "Feature 10",
            hint: "e.g. ratio or log value",
        },
    ]
}

/// Parse one form submission into the ordered feature vector
///
/// Values are trimmed before parsing.
///
/// # Errors
///
/// Returns `InvalidInput` naming the first field that is missing, empty,
/// or not a number; no partial vector is produced.
pub fn parse_features(form: &HashMap<String, String>, specs: &[FeatureSpec]) -> Result<Vec<f32>> {
    let mut values = Vec::with_capacity(specs.len());
    for spec in specs {
        let raw = form.get(spec.key).map_or("", |v| v.trim());
        if raw.is_empty() {
            return Err(PredecirError::InvalidInput {
                reason: format!("missing value for {}", spec.key),
            });
        }
        let value: f32 = raw.parse().map_err(|_| PredecirError::InvalidInput {
            reason: format!("{} is not a number: {raw:?}", spec.key),
        })?;
        values.push(value);
    }
    Ok(values)
}
