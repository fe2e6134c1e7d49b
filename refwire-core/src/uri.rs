use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::ResolveError;

/// Identity of a remote entity.
///
/// Equality and hashing use only the raw URI string; the resource prefix and
/// parameters are carried along so an entity can derive its identifier
/// without going back to the registry.
#[derive(Debug, Clone)]
pub struct ResourceUri {
    raw: Arc<str>,
    prefix: Arc<str>,
    params: Vec<String>,
}

impl ResourceUri {
    pub(crate) fn new(raw: &str, prefix: &str, params: Vec<String>) -> Self {
        Self {
            raw: Arc::from(raw),
            prefix: Arc::from(prefix),
            params,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Registered resource prefix this URI matched, e.g. `/user`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path segments after the prefix. The first one is the identifier.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Numeric identifier taken from the first parameter.
    pub fn id(&self) -> Result<u64, ResolveError> {
        let segment = self.params.first().map(String::as_str).unwrap_or_default();
        segment
            .parse::<u64>()
            .map_err(|_| ResolveError::InvalidIdentifier {
                uri: self.raw.to_string(),
                segment: segment.to_string(),
            })
    }
}

impl PartialEq for ResourceUri {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ResourceUri {}

impl Hash for ResourceUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for ResourceUri {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
