use refwire_core::{HydrateError, ResolveError};
use refwire_transport::TransportError;
use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the client.
///
/// Cloneable because every caller coalesced onto one in-flight request
/// receives the same outcome. Transport errors are shared, not copied.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Hydrate(#[from] HydrateError),

    #[error("transport error: {0}")]
    Transport(Arc<TransportError>),

    #[error("expected {expected} from {uri}, found {found}")]
    UnexpectedValue {
        uri: String,
        expected: String,
        found: &'static str,
    },
}

impl ClientError {
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            ClientError::Transport(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_unknown_resource(&self) -> bool {
        matches!(self, ClientError::Resolve(err) if err.is_unknown_resource())
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(Arc::new(err))
    }
}
