//! Rule sources
//!
//! Rules normally live in a ConfigMap (`default/mutation-rules-configmap`,
//! key `rules.json`). A local file can be used instead for development and for
//! the `render` command.

use std::path::PathBuf;

use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::Api;
use kube::Client;
use tracing::{info, warn};

use crate::rule::{parse_rules, MutationRule};
use crate::{Error, Result};

/// Default name of the rules ConfigMap
pub const DEFAULT_RULES_CONFIGMAP: &str = "mutation-rules-configmap";

/// Default namespace of the rules ConfigMap
pub const DEFAULT_RULES_NAMESPACE: &str = "default";

/// Default data key holding the rule document
pub const DEFAULT_RULES_KEY: &str = "rules.json";

/// Where mutation rules are read from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleSource {
    /// A key of a namespaced ConfigMap
    ConfigMap {
        /// ConfigMap name
        name: String,
        /// ConfigMap namespace
        namespace: String,
        /// Data key holding the rule document
        key: String,
    },
    /// A JSON or YAML file on disk
    File(PathBuf),
}

impl Default for RuleSource {
    fn default() -> Self {
        Self::ConfigMap {
            name: DEFAULT_RULES_CONFIGMAP.to_string(),
            namespace: DEFAULT_RULES_NAMESPACE.to_string(),
            key: DEFAULT_RULES_KEY.to_string(),
        }
    }
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigMap {
                name,
                namespace,
                key,
            } => write!(f, "configmap {}/{} key {}", namespace, name, key),
            Self::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

impl RuleSource {
    /// Read and parse the rules
    ///
    /// The Kubernetes client is only created for ConfigMap sources, using the
    /// in-cluster configuration with a fallback to the local kubeconfig.
    pub async fn load(&self) -> Result<Vec<MutationRule>> {
        match self {
            Self::ConfigMap {
                name,
                namespace,
                key,
            } => {
                let client = Client::try_default().await?;
                load_from_configmap(client, name, namespace, key).await
            }
            Self::File(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|e| {
                    Error::rule_source(format!("failed to read {}: {}", path.display(), e))
                })?;
                parse_rules(&text)
            }
        }
    }

    /// Read the rules, falling back to an empty list on any error
    ///
    /// An unreadable source must not keep the webhook from starting: with no
    /// rules every pod is admitted unchanged.
    pub async fn load_or_empty(&self) -> Vec<MutationRule> {
        match self.load().await {
            Ok(rules) => {
                info!(source = %self, rules = rules.len(), "Loaded mutation rules from source");
                rules
            }
            Err(e) => {
                warn!(
                    source = %self,
                    error = %e,
                    "Failed to load mutation rules, continuing with none"
                );
                Vec::new()
            }
        }
    }
}

/// Read rules from `key` of the ConfigMap `namespace/name`
///
/// A ConfigMap without the key holds no rules.
pub async fn load_from_configmap(
    client: Client,
    name: &str,
    namespace: &str,
    key: &str,
) -> Result<Vec<MutationRule>> {
    let api: Api<ConfigMap> = Api::namespaced(client, namespace);
    let config_map = api.get(name).await?;
    rules_from_configmap(&config_map, key)
}

/// Extract and parse the rule document stored under `key`
pub fn rules_from_configmap(config_map: &ConfigMap, key: &str) -> Result<Vec<MutationRule>> {
    match config_map.data.as_ref().and_then(|d| d.get(key)) {
        Some(document) => parse_rules(document),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Write;

    fn config_map(data: Option<&[(&str, &str)]>) -> ConfigMap {
        ConfigMap {
            data: data.map(|pairs| {
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn default_source_is_rules_configmap() {
        assert_eq!(
            RuleSource::default().to_string(),
            "configmap default/mutation-rules-configmap key rules.json"
        );
    }

    #[test]
    fn configmap_rules_are_parsed() {
        let cm = config_map(Some(&[(
            "rules.json",
            r#"[{"name": "spot", "podSelector": "workload=batch"}]"#,
        )]));
        let rules = rules_from_configmap(&cm, DEFAULT_RULES_KEY).unwrap();
        assert_eq!(rules[0].name, "spot");
    }

    #[test]
    fn missing_key_means_no_rules() {
        let cm = config_map(Some(&[("other.json", "[]")]));
        assert!(rules_from_configmap(&cm, DEFAULT_RULES_KEY)
            .unwrap()
            .is_empty());
        assert!(rules_from_configmap(&config_map(None), DEFAULT_RULES_KEY)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_document_is_an_error() {
        let cm = config_map(Some(&[("rules.json", "[{")]));
        assert!(rules_from_configmap(&cm, DEFAULT_RULES_KEY).is_err());
    }

    #[tokio::test]
    async fn file_source_loads_rules() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let doc = r#"[{"name": "from-file", "addNodeSelectors": {"zone": "a"}}]"#;
        file.write_all(doc.as_bytes()).unwrap();

        let source = RuleSource::File(file.path().to_path_buf());
        let rules = source.load().await.unwrap();
        assert_eq!(rules[0].name, "from-file");
        assert_eq!(rules[0].add_node_selectors["zone"], "a");
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_no_rules() {
        let source = RuleSource::File(PathBuf::from("/nonexistent/rules.json"));
        assert!(matches!(source.load().await, Err(Error::RuleSource(_))));
        assert!(source.load_or_empty().await.is_empty());
    }
}
