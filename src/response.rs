//! Admission decisions
//!
//! The mutator never denies a pod. A successful evaluation becomes an allowed
//! decision carrying the patch; any error becomes an allowed decision with no
//! patch, so the pod is admitted exactly as submitted.

use json_patch::{Patch, PatchOperation};
use kube::api::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse};
use tracing::{error, info};

use crate::evaluator::Evaluation;
use crate::Result;

/// The mutator's verdict for one admission request
#[derive(Clone, Debug, PartialEq)]
pub struct AdmissionDecision {
    /// UID of the admission request this decision answers
    pub uid: String,
    /// Always true: the mutator only ever changes pods, it never rejects them
    pub allowed: bool,
    /// Operations to apply; `None` when evaluation failed
    pub patch: Option<Vec<PatchOperation>>,
}

impl AdmissionDecision {
    /// An allowed decision carrying `operations` (possibly empty)
    pub fn mutate(uid: impl Into<String>, operations: Vec<PatchOperation>) -> Self {
        Self {
            uid: uid.into(),
            allowed: true,
            patch: Some(operations),
        }
    }

    /// An allowed decision with no patch
    pub fn fail_open(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            allowed: true,
            patch: None,
        }
    }

    /// Convert into a kube admission response for `request`
    ///
    /// The response echoes the request UID. If the patch cannot be encoded
    /// the pod is still admitted, unpatched.
    pub fn into_response(self, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
        let Some(operations) = self.patch else {
            return AdmissionResponse::from(request);
        };

        match AdmissionResponse::from(request).with_patch(Patch(operations)) {
            Ok(response) => response,
            Err(e) => {
                error!(uid = %self.uid, error = %e, "Failed to serialize patch, failing open");
                AdmissionResponse::from(request)
            }
        }
    }
}

/// Assemble the decision for an evaluation result
///
/// This is the single place where errors are turned into the fail-open
/// decision.
pub fn assemble(uid: &str, result: Result<Evaluation>) -> AdmissionDecision {
    match result {
        Ok(evaluation) if evaluation.is_noop() => {
            info!(uid = %uid, "No mutation rule applies, admitting pod unchanged");
            AdmissionDecision::mutate(uid, evaluation.operations)
        }
        Ok(evaluation) => {
            info!(
                uid = %uid,
                rule = evaluation.matched_rule.as_deref().unwrap_or("<none>"),
                patch_ops = evaluation.operations.len(),
                "Admitting pod"
            );
            AdmissionDecision::mutate(uid, evaluation.operations)
        }
        Err(e) => {
            error!(
                uid = %uid,
                error = %e,
                "Error processing mutation, failing open to allow pod creation"
            );
            AdmissionDecision::fail_open(uid)
        }
    }
}
