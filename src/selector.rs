//! Equality-based pod label selectors
//!
//! Rules select pods with a comma-separated list of `key=value` clauses, all of
//! which must be present on the pod (`env=prod,tier=web`). The empty string is
//! a valid selector with no clauses and selects every pod.

use std::collections::BTreeMap;

use crate::{Error, Result};

/// A parsed label selector: a conjunction of exact `key=value` requirements
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<(String, String)>,
}

impl Selector {
    /// Parse a selector expression.
    ///
    /// Each clause is split on its first `=`, so values may themselves contain
    /// `=`. A clause with no `=` (including an empty clause) is rejected.
    pub fn parse(expr: &str) -> Result<Self> {
        if expr.is_empty() {
            return Ok(Self::default());
        }

        let requirements = expr
            .split(',')
            .map(|clause| {
                clause
                    .split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| {
                        Error::invalid_selector(format!(
                            "clause '{}' in selector '{}' has no '='",
                            clause, expr
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { requirements })
    }

    /// Whether every requirement is an exact entry of `labels`
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }

    /// Whether this selector has no requirements and so matches everything
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

/// Parse `expr` and test it against `labels` in one step
pub fn matches(labels: &BTreeMap<String, String>, expr: &str) -> Result<bool> {
    Ok(Selector::parse(expr)?.matches(labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_selector_matches_everything() {
        assert!(matches(&labels(&[]), "").unwrap());
        assert!(matches(&labels(&[("env", "prod")]), "").unwrap());
        assert!(Selector::parse("").unwrap().is_empty());
    }

    #[test]
    fn single_clause_requires_exact_entry() {
        let l = labels(&[("env", "prod")]);
        assert!(matches(&l, "env=prod").unwrap());
        assert!(!matches(&l, "env=dev").unwrap());
        assert!(!matches(&l, "tier=prod").unwrap());
    }

    #[test]
    fn clauses_are_anded() {
        let l = labels(&[("env", "prod"), ("tier", "web"), ("team", "a")]);
        assert!(matches(&l, "env=prod,tier=web").unwrap());
        assert!(!matches(&l, "env=prod,tier=db").unwrap());
    }

    #[test]
    fn value_split_on_first_equals() {
        let selector = Selector::parse("expr=a=b").unwrap();
        assert!(selector.matches(&labels(&[("expr", "a=b")])));
        assert!(!selector.matches(&labels(&[("expr", "a")])));
    }

    #[test]
    fn empty_value_is_allowed() {
        let selector = Selector::parse("canary=").unwrap();
        assert!(selector.matches(&labels(&[("canary", "")])));
        assert!(!selector.matches(&labels(&[])));
    }

    #[test]
    fn no_whitespace_trimming() {
        let l = labels(&[("env", "prod")]);
        assert!(!matches(&l, "env=prod, tier=web").unwrap());
        assert!(!matches(&l, " env=prod").unwrap());
    }

    #[test]
    fn clause_without_equals_is_rejected() {
        let err = Selector::parse("env=prod,tier").unwrap_err();
        assert!(err.is_rule_scoped());
        assert!(err.to_string().contains("'tier'"));
    }

    #[test]
    fn trailing_comma_is_rejected() {
        assert!(Selector::parse("env=prod,").is_err());
        assert!(Selector::parse(",").is_err());
    }

    /// Story: a selector is a subset test over label entries
    ///
    /// Every subset of a pod's labels, written as a selector, matches the pod;
    /// adding any entry the pod does not carry breaks the match.
    #[test]
    fn story_selector_is_subset_of_entries() {
        let pod = labels(&[("app", "api"), ("env", "prod"), ("zone", "a")]);
        let entries: Vec<_> = pod.iter().collect();

        for mask in 0u32..(1 << entries.len()) {
            let expr = entries
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, (k, v))| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(",");
            assert!(
                matches(&pod, &expr).unwrap(),
                "subset '{}' should match",
                expr
            );

            let extended = if expr.is_empty() {
                "gpu=true".to_string()
            } else {
                format!("{},gpu=true", expr)
            };
            assert!(!matches(&pod, &extended).unwrap());
        }
    }
}
