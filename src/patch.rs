//! JSON patch generation for a matched rule
//!
//! The builder compares the rule against the pod's current scheduling state
//! and emits operations in a fixed order:
//!
//! 1. create `spec.nodeSelector` when it is absent or empty
//! 2. remove node selector keys the rule drops (only those present)
//! 3. add or overwrite node selector keys the rule sets
//! 4. create `spec.tolerations` when the rule adds tolerations and none exist
//! 5. append each toleration
//!
//! Containers are always created before anything is written into them.

use json_patch::{AddOperation, PatchOperation, RemoveOperation};
use serde_json::Value;

use crate::pointer;
use crate::rule::MutationRule;
use crate::workload::WorkloadView;
use crate::Result;

const NODE_SELECTOR: &str = "nodeSelector";
const TOLERATIONS: &str = "tolerations";

/// Build the patch operations that apply `rule` to `workload`
pub fn build(rule: &MutationRule, workload: &WorkloadView) -> Result<Vec<PatchOperation>> {
    let mut ops = Vec::new();

    let current = workload.node_selector.as_ref().filter(|ns| !ns.is_empty());
    if current.is_none() {
        ops.push(add(
            pointer::spec_field(NODE_SELECTOR)?,
            Value::Object(Default::default()),
        ));
    }

    if let Some(current) = current {
        for key in &rule.remove_node_selectors {
            if current.contains_key(key) {
                ops.push(PatchOperation::Remove(RemoveOperation {
                    path: pointer::spec_key(NODE_SELECTOR, key)?,
                }));
            }
        }
    }

    for (key, value) in &rule.add_node_selectors {
        ops.push(add(
            pointer::spec_key(NODE_SELECTOR, key)?,
            Value::String(value.clone()),
        ));
    }

    if !rule.add_tolerations.is_empty() {
        if workload.tolerations.is_none() {
            ops.push(add(pointer::spec_field(TOLERATIONS)?, Value::Array(Vec::new())));
        }

        let append = pointer::from_escaped(["spec", TOLERATIONS, "-"])?;
        for toleration in &rule.add_tolerations {
            ops.push(add(
                append.clone(),
                Value::Object(pointer::escape_keys(toleration)),
            ));
        }
    }

    Ok(ops)
}

fn add(path: jsonptr::PointerBuf, value: Value) -> PatchOperation {
    PatchOperation::Add(AddOperation { path, value })
}
