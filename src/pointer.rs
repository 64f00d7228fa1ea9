//! JSON pointer path helpers for patch generation
//!
//! Dynamic keys (node selector keys such as `topology.kubernetes.io/zone`)
//! must be escaped before being used as path segments: `~` becomes `~0` and
//! `/` becomes `~1`, in that order so the `~` introduced by the second step is
//! never escaped again.

use jsonptr::PointerBuf;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Escape a single path segment per RFC 6901
pub fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Build a pointer from already-escaped segments
///
/// The joined path is validated, so a malformed escape sequence surfaces as
/// an error instead of producing a pointer to the wrong location.
pub fn from_escaped<I, S>(segments: I) -> Result<PointerBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path: String = segments
        .into_iter()
        .map(|s| format!("/{}", s.as_ref()))
        .collect();
    PointerBuf::parse(path.as_str())
        .map_err(|e| Error::pointer(format!("invalid path '{}': {}", path, e)))
}

/// Pointer to a field under `spec` with a raw (unescaped) trailing key
pub fn spec_key(field: &str, key: &str) -> Result<PointerBuf> {
    from_escaped(["spec", field, &escape(key)])
}

/// Pointer to a top-level `spec` field
pub fn spec_field(field: &str) -> Result<PointerBuf> {
    from_escaped(["spec", field])
}

/// Escape every key of an object
///
/// Used for toleration records, whose keys are treated as path segments.
pub fn escape_keys(record: &Map<String, Value>) -> Map<String, Value> {
    record.iter().map(|(k, v)| (escape(k), v.clone())).collect()
}
