use refwire_core::{KeyCase, NamingConvention};
use serde::{Deserialize, Serialize};

/// What the hydrator does with a field the resource does not declare.
/// Only applies to resources registered with a non-empty field map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Drop the field.
    #[default]
    Ignore,
    /// Fail hydration with `HydrateError::UnknownField`.
    Reject,
    /// Hand the field to the constructor anyway.
    Keep,
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Global path prefix stripped before resource prefixes are matched
    pub base_path: String,
    /// Naming convention of keys on the wire
    pub wire_case: KeyCase,
    /// Naming convention of keys in property bags
    pub host_case: KeyCase,
    pub unknown_fields: UnknownFieldPolicy,
    /// Keep a failed request in the pending ledger so later calls for the
    /// same URI observe the same failure instead of retrying.
    pub retain_failed_requests: bool,
    /// Install an in-memory object cache
    pub use_cache: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            wire_case: KeyCase::SnakeCase,
            host_case: KeyCase::CamelCase,
            unknown_fields: UnknownFieldPolicy::Ignore,
            retain_failed_requests: false,
            use_cache: true,
        }
    }
}

impl ClientConfig {
    pub fn naming(&self) -> NamingConvention {
        NamingConvention::new(self.wire_case, self.host_case)
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_naming(mut self, wire_case: KeyCase, host_case: KeyCase) -> Self {
        self.wire_case = wire_case;
        self.host_case = host_case;
        self
    }

    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn with_retain_failed_requests(mut self, retain: bool) -> Self {
        self.retain_failed_requests = retain;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}
