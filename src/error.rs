//! Error types for the placement mutator

use thiserror::Error;

/// Main error type for placement mutator operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A rule's pod selector could not be parsed
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// The admitted object could not be projected into a workload view
    #[error("projection error: {0}")]
    Projection(String),

    /// A JSON pointer could not be built from escaped segments
    #[error("pointer error: {0}")]
    Pointer(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The rule source could not be read
    #[error("rule source error: {0}")]
    RuleSource(String),

    /// Kubernetes API error
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Server or CLI configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid selector error with the given message
    pub fn invalid_selector(msg: impl Into<String>) -> Self {
        Self::InvalidSelector(msg.into())
    }

    /// Create a projection error with the given message
    pub fn projection(msg: impl Into<String>) -> Self {
        Self::Projection(msg.into())
    }

    /// Create a pointer error with the given message
    pub fn pointer(msg: impl Into<String>) -> Self {
        Self::Pointer(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a rule source error with the given message
    pub fn rule_source(msg: impl Into<String>) -> Self {
        Self::RuleSource(msg.into())
    }

    /// Create a configuration error with the given message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error only invalidates a single rule
    ///
    /// Rule-scoped errors are skipped by the evaluator; everything else
    /// escalates to the fail-open fallback.
    pub fn is_rule_scoped(&self) -> bool {
        matches!(self, Error::InvalidSelector(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
