//! Pod Mutation Webhook
//!
//! Handles AdmissionReview requests for Pods, applying the first matching
//! mutation rule to the pod's scheduling constraints.

use std::sync::Arc;

use axum::{extract::State, Json};
use kube::{
    api::DynamicObject,
    core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
};
use tracing::{debug, error, info};

use crate::evaluator;
use crate::response::assemble;
use crate::rule::MutationRule;
use crate::workload::WorkloadView;

use super::WebhookState;

/// Kind of object this webhook mutates
pub const POD_KIND: &str = "Pod";

/// Handle mutating admission review for Pods
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<DynamicObject> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let rules = state.rules.snapshot();
    let response = mutate_pod(&rules, &req);
    Json(response.into_review())
}

/// Process a single pod admission request against `rules`
///
/// Only Pod creation is mutated; every other request is allowed unchanged.
pub fn mutate_pod(
    rules: &[MutationRule],
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let uid = request.uid.as_str();

    if !matches!(request.operation, Operation::Create) {
        debug!(uid = %uid, operation = ?request.operation, "Not a create, allowing unchanged");
        return AdmissionResponse::from(request);
    }

    if request.kind.kind != POD_KIND {
        debug!(uid = %uid, kind = %request.kind.kind, "Not a pod, allowing unchanged");
        return AdmissionResponse::from(request);
    }

    let pod = match &request.object {
        Some(pod) => pod,
        None => {
            debug!(uid = %uid, "No pod object in request, allowing unchanged");
            return AdmissionResponse::from(request);
        }
    };

    info!(
        uid = %uid,
        pod = ?pod.metadata.name.as_ref().or(pod.metadata.generate_name.as_ref()),
        namespace = ?request.namespace,
        rules = rules.len(),
        "Received pod mutation request"
    );

    let result = WorkloadView::from_dynamic(pod)
        .and_then(|workload| evaluator::evaluate(rules, &workload));

    assemble(uid, result).into_response(request)
}
