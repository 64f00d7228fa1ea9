//! Placement Mutator - scheduling-constraint admission webhook for Kubernetes
//!
//! Rewrites a Pod's `spec.nodeSelector` and `spec.tolerations` at creation
//! time from an ordered list of declarative mutation rules.
//!
//! # Evaluation
//!
//! - Rules are checked in order against the pod's labels
//! - The first matching rule produces a JSON patch; later rules are ignored
//! - Pods are always admitted: errors admit the pod unchanged (fail-open)
//!
//! # Modules
//!
//! - [`selector`] - `key=value` label selectors
//! - [`pointer`] - JSON pointer escaping for patch paths
//! - [`patch`] - Patch generation for a matched rule
//! - [`evaluator`] - First-match rule evaluation
//! - [`response`] - Fail-open admission decisions
//! - [`rule`] - Mutation rule definitions
//! - [`workload`] - Pod projection used by the evaluator
//! - [`store`] - Atomically reloadable rule snapshot
//! - [`source`] - Rule loading from ConfigMaps and files
//! - [`webhook`] - Admission webhook handlers
//! - [`server`] - HTTPS server
//! - [`telemetry`] - Logging setup
//! - [`error`] - Error types

#![deny(missing_docs)]

pub mod error;
pub mod evaluator;
pub mod patch;
pub mod pointer;
pub mod response;
pub mod rule;
pub mod selector;
pub mod server;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod webhook;
pub mod workload;

pub use error::Error;
pub use evaluator::{evaluate, Evaluation};
pub use response::{assemble, AdmissionDecision};
pub use rule::MutationRule;
pub use store::RuleStore;
pub use workload::WorkloadView;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default port for the webhook HTTPS server
///
/// Port 8443 is used instead of 443 to avoid requiring root privileges.
pub const DEFAULT_WEBHOOK_PORT: u16 = 8443;
