//! Error handling for endpoint calls.
//!
//! Every failed call returns exactly one [`EndpointError`]. The variant tells
//! which pipeline stage produced it:
//! - `EncodingError`: the wire request could not be built; nothing was sent
//! - `TransportError`, `Cancelled`, `DeadlineExceeded`: the round trip failed
//! - `DecodingError`: a response arrived but could not become the typed result
//!
//! # Example
//!
//! ```rust,ignore
//! use wirecall::error::{CallStage, EndpointError};
//!
//! let err = EndpointError::encoding("bad body");
//! assert_eq!(err.stage(), Some(CallStage::Encode));
//! ```

pub mod types;

pub use types::*;
