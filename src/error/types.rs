//! Core error types.

use thiserror::Error;

/// Boxed error used at the collaborator boundary (encoders, decoders, transports).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStage {
    /// Request construction and body serialization.
    Encode,
    /// Transport round trip, including cancellation and deadline expiry.
    Send,
    /// Conversion of the wire response into the typed result.
    Decode,
}

impl std::fmt::Display for CallStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CallStage::Encode => "encode",
            CallStage::Send => "send",
            CallStage::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Errors returned by endpoint calls and client construction.
///
/// Collaborator errors are kept as the `source()` so callers can downcast to
/// the concrete type they produced.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Building the wire request failed (malformed target or encoder failure).
    #[error("Encoding error: {0}")]
    EncodingError(#[source] BoxError),

    /// The transport round trip failed.
    #[error("Transport error: {0}")]
    TransportError(#[source] BoxError),

    /// The response could not be decoded into the typed result.
    #[error("Decoding error: {0}")]
    DecodingError(#[source] BoxError),

    /// The call context was cancelled before the round trip completed.
    #[error("Request cancelled")]
    Cancelled,

    /// The call context deadline passed before the round trip completed.
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Invalid client or HTTP configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl EndpointError {
    /// Wrap an encoder or request-construction failure.
    pub fn encoding(err: impl Into<BoxError>) -> Self {
        Self::EncodingError(err.into())
    }

    /// Wrap a transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::TransportError(err.into())
    }

    /// Wrap a decoder failure.
    pub fn decoding(err: impl Into<BoxError>) -> Self {
        Self::DecodingError(err.into())
    }

    /// The pipeline stage that produced this error, `None` for configuration errors.
    pub fn stage(&self) -> Option<CallStage> {
        match self {
            Self::EncodingError(_) => Some(CallStage::Encode),
            Self::TransportError(_) | Self::Cancelled | Self::DeadlineExceeded => {
                Some(CallStage::Send)
            }
            Self::DecodingError(_) => Some(CallStage::Decode),
            Self::ConfigurationError(_) => None,
        }
    }

    /// Whether the error came from context cancellation or deadline expiry.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Whether any network activity could have happened before the failure.
    pub fn reached_network(&self) -> bool {
        !matches!(self, Self::EncodingError(_) | Self::ConfigurationError(_))
    }
}
