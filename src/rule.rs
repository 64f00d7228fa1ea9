//! Mutation rule definitions
//!
//! Rules are read from a JSON document (a top-level array) in the rules
//! ConfigMap:
//!
//! ```json
//! [
//!   {
//!     "name": "spot-batch",
//!     "podSelector": "workload=batch",
//!     "removeNodeSelectors": ["node-pool"],
//!     "addNodeSelectors": {"lifecycle": "spot"},
//!     "addTolerations": [{"key": "spot", "operator": "Exists", "effect": "NoSchedule"}]
//!   }
//! ]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;

/// A toleration record, kept opaque so any toleration field passes through
pub type Toleration = Map<String, Value>;

/// One configured scheduling mutation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRule {
    /// Identifier used in logs
    #[serde(default)]
    pub name: String,

    /// Comma-separated `key=value` label requirements; empty selects every pod
    #[serde(default)]
    pub pod_selector: String,

    /// Node selector keys to delete when present on the pod
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_node_selectors: Vec<String>,

    /// Node selector entries to add or overwrite
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub add_node_selectors: BTreeMap<String, String>,

    /// Tolerations appended to the pod, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_tolerations: Vec<Toleration>,
}

impl MutationRule {
    /// Create an empty rule that selects every pod and mutates nothing
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the pod selector expression
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.pod_selector = selector.into();
        self
    }

    /// Add a node selector key to remove
    pub fn removing(mut self, key: impl Into<String>) -> Self {
        self.remove_node_selectors.push(key.into());
        self
    }

    /// Add a node selector entry to set
    pub fn adding(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_node_selectors.insert(key.into(), value.into());
        self
    }

    /// Append a toleration
    pub fn tolerating(mut self, toleration: Toleration) -> Self {
        self.add_tolerations.push(toleration);
        self
    }
}

/// Parse a rule document.
///
/// The document is a JSON array of rules; YAML is accepted as well since
/// rules files are often written by hand. Blank documents yield no rules.
pub fn parse_rules(text: &str) -> Result<Vec<MutationRule>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(trimmed) {
        Ok(rules) => Ok(rules),
        Err(json_err) => serde_yaml::from_str(trimmed).map_err(|yaml_err| {
            crate::Error::serialization(format!(
                "rules are neither valid JSON ({}) nor YAML ({})",
                json_err, yaml_err
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_rule() {
        let rules = parse_rules(
            r#"[{
                "name": "r1",
                "podSelector": "env=prod",
                "removeNodeSelectors": ["disktype"],
                "addNodeSelectors": {"zone": "us-east"},
                "addTolerations": [{"key": "spot", "operator": "Exists"}]
            }]"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.name, "r1");
        assert_eq!(rule.pod_selector, "env=prod");
        assert_eq!(rule.remove_node_selectors, vec!["disktype"]);
        assert_eq!(rule.add_node_selectors["zone"], "us-east");
        assert_eq!(rule.add_tolerations[0]["operator"], "Exists");
    }

    #[test]
    fn absent_fields_default_to_no_op() {
        let rules = parse_rules(r#"[{"name": "bare"}]"#).unwrap();
        assert_eq!(rules[0], MutationRule::new("bare"));
        assert!(rules[0].pod_selector.is_empty());
        assert!(rules[0].add_tolerations.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let rules = parse_rules(r#"[{"name": "x", "priority": 10}]"#).unwrap();
        assert_eq!(rules[0].name, "x");
    }

    #[test]
    fn order_is_preserved() {
        let doc = r#"[{"name": "first"}, {"name": "second"}, {"name": "third"}]"#;
        let rules = parse_rules(doc).unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn blank_document_is_empty() {
        assert!(parse_rules("").unwrap().is_empty());
        assert!(parse_rules("  \n").unwrap().is_empty());
        assert!(parse_rules("[]").unwrap().is_empty());
    }

    #[test]
    fn yaml_document_is_accepted() {
        let rules = parse_rules(
            r#"
- name: gpu
  podSelector: accel=gpu
  addNodeSelectors:
    nvidia.com/gpu.present: "true"
"#,
        )
        .unwrap();
        assert_eq!(rules[0].name, "gpu");
        assert_eq!(rules[0].add_node_selectors["nvidia.com/gpu.present"], "true");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let err = parse_rules(r#"{"name": "not-a-list"}"#).unwrap_err();
        assert!(err.to_string().contains("serialization error"));
    }

    #[test]
    fn builder_matches_parsed_rule() {
        let built = MutationRule::new("r1")
            .with_selector("env=prod")
            .removing("disktype")
            .adding("zone", "us-east");
        let parsed = parse_rules(
            r#"[{
                "name": "r1",
                "podSelector": "env=prod",
                "removeNodeSelectors": ["disktype"],
                "addNodeSelectors": {"zone": "us-east"}
            }]"#,
        )
        .unwrap();
        assert_eq!(built, parsed[0]);
    }
}
