//! Workload projection
//!
//! The webhook only needs three fields from an admitted Pod. They are picked
//! out with an explicit serde projection; every other field of the object is
//! ignored, so new or unknown Pod fields never affect evaluation.

use std::collections::BTreeMap;

use kube::api::DynamicObject;
use serde::Deserialize;

use crate::rule::Toleration;
use crate::{Error, Result};

/// The scheduling-relevant view of a Pod
///
/// `node_selector` and `tolerations` keep the difference between an absent
/// field and an empty one, because an absent container has to be created by
/// the patch before entries can be added to it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkloadView {
    /// Pod labels (absent labels are empty)
    pub labels: BTreeMap<String, String>,
    /// `spec.nodeSelector`
    pub node_selector: Option<BTreeMap<String, String>>,
    /// `spec.tolerations`
    pub tolerations: Option<Vec<Toleration>>,
    /// The object has no `spec` at all, so nothing under `/spec` can be patched
    pub spec_missing: bool,
}

#[derive(Debug, Default, Deserialize)]
struct PodProjection {
    #[serde(default)]
    metadata: MetaProjection,
    #[serde(default)]
    spec: Option<SpecProjection>,
}

#[derive(Debug, Default, Deserialize)]
struct MetaProjection {
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecProjection {
    #[serde(default)]
    node_selector: Option<BTreeMap<String, String>>,
    #[serde(default)]
    tolerations: Option<Vec<Toleration>>,
}

impl From<PodProjection> for WorkloadView {
    fn from(pod: PodProjection) -> Self {
        Self::from_parts(pod.metadata.labels.unwrap_or_default(), pod.spec)
    }
}

impl WorkloadView {
    /// Project a raw Pod document
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        PodProjection::deserialize(value)
            .map(Self::from)
            .map_err(|e| Error::projection(format!("unrecognized pod shape: {}", e)))
    }

    /// Project an admitted object as delivered in an AdmissionReview
    ///
    /// `DynamicObject` splits metadata from the rest of the document, so
    /// labels come from the typed metadata and the spec from the raw data.
    pub fn from_dynamic(obj: &DynamicObject) -> Result<Self> {
        let spec = match obj.data.get("spec") {
            Some(spec) => Option::<SpecProjection>::deserialize(spec)
                .map_err(|e| Error::projection(format!("unrecognized pod spec: {}", e)))?,
            None => None,
        };

        Ok(Self::from_parts(obj.metadata.labels.clone().unwrap_or_default(), spec))
    }

    fn from_parts(labels: BTreeMap<String, String>, spec: Option<SpecProjection>) -> Self {
        match spec {
            Some(spec) => Self {
                labels,
                node_selector: spec.node_selector,
                tolerations: spec.tolerations,
                spec_missing: false,
            },
            None => Self {
                labels,
                spec_missing: true,
                ..Self::default()
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}
