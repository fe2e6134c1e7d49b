use thiserror::Error;

/// Failures raised while classifying a URI against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No registered prefix matches the path.
    #[error("unknown resource: no registered prefix matches {uri}")]
    UnknownResource { uri: String },

    /// The identifier segment is not numeric.
    #[error("invalid identifier {segment:?} in {uri}")]
    InvalidIdentifier { uri: String, segment: String },

    #[error("resource prefix must start with '/' and must not end with it: {prefix:?}")]
    InvalidPrefix { prefix: String },
}

impl ResolveError {
    pub fn unknown_resource(uri: impl Into<String>) -> Self {
        ResolveError::UnknownResource { uri: uri.into() }
    }

    pub fn is_unknown_resource(&self) -> bool {
        matches!(self, ResolveError::UnknownResource { .. })
    }
}

/// Failures raised while turning wire JSON into host values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HydrateError {
    #[error("invalid date marker: {value}")]
    InvalidDate { value: String },

    #[error("marker {marker} must carry a string URI, found {found}")]
    InvalidMarker { marker: &'static str, found: String },

    #[error("missing field {field}")]
    MissingField { field: String },

    #[error("field {field}: expected {expected}, found {found}")]
    UnexpectedFieldType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field {field} is not declared by resource {resource}")]
    UnknownField { resource: String, field: String },

    #[error("failed to construct {resource}: {message}")]
    Construct { resource: String, message: String },

    /// Two wire keys in one object renamed to the same host key.
    #[error("keys {first} and {second} both map to {key}")]
    KeyCollision {
        key: String,
        first: String,
        second: String,
    },
}

impl HydrateError {
    pub fn missing(field: impl Into<String>) -> Self {
        HydrateError::MissingField {
            field: field.into(),
        }
    }

    pub fn construct(resource: impl Into<String>, message: impl Into<String>) -> Self {
        HydrateError::Construct {
            resource: resource.into(),
            message: message.into(),
        }
    }
}
