//! HTTP surface for the prediction service
//!
//! One logical endpoint plus a health check:
//!
//! - `GET /` - render the empty feature form
//! - `POST /` - parse the submission, predict, render form plus result
//! - `GET /health` - health check JSON
//!
//! ## Example
//!
//! ```rust,ignore
//! use predecir::api::{create_router, AppState};
//!
//! let state = AppState::new(model, features, log);
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    response::Html,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::warn;

use crate::features::{parse_features, FeatureSpec};
use crate::model::ModelHandle;
use crate::record::PredictionLog;


/// Application state shared across handlers
///
/// The model handle is established once at startup and never replaced;
/// `None` means every prediction attempt reports model-unavailable. The
/// prediction log is the only shared mutable resource and serializes its
/// own writes.
#[derive(Clone)]
pub struct AppState {
    model: Option<Arc<ModelHandle>>,
    features: Arc<Vec<FeatureSpec>>,
    log: Arc<PredictionLog>,
}

impl AppState {
    /// Create new application state
    #[must_use]
    pub fn new(model: Option<ModelHandle>, features: Vec<FeatureSpec>, log: PredictionLog) -> Self {
        Self {
            model: model.map(Arc::new),
            features: Arc::new(features),
            log: Arc::new(log),
        }
    }

    /// Whether a model was resolved at startup
    #[must_use]
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }
}

/// Build the router with all routes
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler).post(predict_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model_loaded: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: crate::VERSION,
        model_loaded: state.has_model(),
    })
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.features, &PageView::default()))
}

async fn predict_handler(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Html<String> {
    let view = run_prediction(&state, &form);
    Html(render_page(&state.features, &view))
}

/// Result of one submission, rendered alongside the form
#[derive(Debug, Default)]
struct PageView {
    prediction: Option<i64>,
    probability: Option<f32>,
    error: Option<String>,
}

fn run_prediction(state: &AppState, form: &HashMap<String, String>) -> PageView {
    let features = match parse_features(form, &state.features) {
        Ok(values) => values,
        Err(err) => {
            return PageView {
                error: Some(format!("Input or prediction error: {err}")),
                ..PageView::default()
            }
        }
    };

    let Some(model) = state.model.as_ref() else {
        return PageView {
            error: Some("Model is not available; predictions are disabled.".to_string()),
            ..PageView::default()
        };
    };

    let prediction = match model.predict(&features) {
        Ok(label) => label,
        Err(err) => {
            return PageView {
                error: Some(format!("Input or prediction error: {err}")),
                ..PageView::default()
            }
        }
    };
    let probability = model.probability(&features);

    if let Err(err) = state
        .log
        .append(&state.features, &features, prediction, probability)
    {
        // Logging is best-effort; the response is unaffected
        warn!(error = %err, "failed to append prediction record");
    }

    PageView {
        prediction: Some(prediction),
        probability,
        error: None,
    }
}

fn render_page(features: &[FeatureSpec], view: &PageView) -> String {
    let mut page = String::with_capacity(2048);
    page.push_str(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Predecir</title>\n</head>\n<body>\n\
         <h1>Classifier demo</h1>\n<form method=\"post\" action=\"/\">\n",
    );
    for spec in features {
        page.push_str(&format!(
            "<label for=\"{key}\">{label}</label>\n\
             <input type=\"text\" id=\"{key}\" name=\"{key}\" placeholder=\"{hint}\">\n",
            key = spec.key,
            label = escape_html(spec.label),
            hint = escape_html(spec.hint),
        ));
    }
    page.push_str("<button type=\"submit\">Predict</button>\n</form>\n");

    if let Some(error) = &view.error {
        page.push_str(&format!(
            "<p class=\"error\">{}</p>\n",
            escape_html(error)
        ));
    }
    if let Some(prediction) = view.prediction {
        page.push_str(&format!(
            "<p class=\"result\">Prediction: {prediction}</p>\n"
        ));
        if let Some(probability) = view.probability {
            page.push_str(&format!(
                "<p class=\"probability\">Probability: {probability:.4}</p>\n"
            ));
        }
    }

    page.push_str("</body>\n</html>\n");
    page
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
