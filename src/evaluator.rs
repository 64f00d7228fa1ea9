//! First-match rule evaluation
//!
//! Rules are scanned in order. The first rule whose selector matches the pod
//! produces the patch and ends the scan; later rules are never inspected, even
//! if they would also match. A rule with an unparseable selector is skipped
//! with a warning so one bad entry in the rules ConfigMap does not disable the
//! rest.

use json_patch::PatchOperation;
use tracing::{debug, info, warn};

use crate::patch;
use crate::rule::MutationRule;
use crate::selector::Selector;
use crate::workload::WorkloadView;
use crate::Result;

/// Outcome of evaluating a rule list against one workload
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluation {
    /// Name of the rule that matched, if any
    pub matched_rule: Option<String>,
    /// Operations to apply (empty when nothing matched)
    pub operations: Vec<PatchOperation>,
    /// Names of rules skipped because their selector was malformed
    pub skipped_rules: Vec<String>,
}

impl Evaluation {
    /// Whether no rule applied
    pub fn is_noop(&self) -> bool {
        self.matched_rule.is_none()
    }
}

/// Evaluate `rules` against `workload` with first-match semantics
///
/// A workload with no spec gets an empty evaluation without any rule being
/// checked. Rule-scoped errors (malformed selectors) are absorbed; any other
/// error from patch construction is returned for the caller to fail open on.
pub fn evaluate(rules: &[MutationRule], workload: &WorkloadView) -> Result<Evaluation> {
    let mut evaluation = Evaluation::default();

    if workload.spec_missing {
        debug!("Pod has no spec, nothing to mutate");
        return Ok(evaluation);
    }

    for rule in rules {
        let selector = match Selector::parse(&rule.pod_selector) {
            Ok(selector) => selector,
            Err(e) if e.is_rule_scoped() => {
                warn!(rule = %rule.name, error = %e, "Skipping rule with malformed selector");
                evaluation.skipped_rules.push(rule.name.clone());
                continue;
            }
            Err(e) => return Err(e),
        };

        let matched = selector.matches(&workload.labels);
        debug!(
            rule = %rule.name,
            selector = %rule.pod_selector,
            catch_all = selector.is_empty(),
            matched,
            "Checked pod against rule selector"
        );
        if !matched {
            continue;
        }

        evaluation.operations = patch::build(rule, workload)?;
        evaluation.matched_rule = Some(rule.name.clone());
        info!(
            rule = %rule.name,
            patch_ops = evaluation.operations.len(),
            "Pod matched rule, stopping evaluation"
        );
        return Ok(evaluation);
    }

    debug!(rules = rules.len(), "No rule matched pod");
    Ok(evaluation)
}
