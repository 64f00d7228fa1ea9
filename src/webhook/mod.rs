//! Mutating Admission Webhook
//!
//! Intercepts Pod creation and rewrites the pod's node selector and
//! tolerations according to the first matching mutation rule.
//!
//! The webhook is fail-open: pods are always admitted, and any error while
//! building the patch admits the pod unchanged.

pub mod pod;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::store::RuleStore;

/// Shared state for webhook handlers
#[derive(Clone, Debug)]
pub struct WebhookState {
    /// Active mutation rules
    pub rules: Arc<RuleStore>,
}

impl WebhookState {
    /// Create a new webhook state over the given rule store
    pub fn new(rules: Arc<RuleStore>) -> Self {
        Self { rules }
    }
}

/// Create the webhook router
///
/// - POST /mutate - AdmissionReview for Pods
/// - GET /healthz - liveness
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/mutate", post(pod::mutate_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}
