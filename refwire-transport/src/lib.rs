pub mod transport;
#[cfg(feature = "http")]
pub mod http;

pub use transport::{FetchOptions, Method, Transport, TransportError};
#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportConfig};
