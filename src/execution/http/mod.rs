//! HTTP Utilities
//!
//! This module contains the wire-level pieces of an endpoint call:
//! - Transport abstraction (one round trip)
//! - Response body lifecycle
//! - Header management
//! - HTTP client configuration

pub mod body;
pub mod client;
pub mod headers;
pub mod transport;

// Re-export main types
pub use body::{BodyAborted, ByteStream, ResponseBody, WireResponse};
pub use client::build_http_client;
pub use headers::{HeaderSource, apply_headers, headers_from_pairs};
pub use transport::{HttpTransport, WireRequest, default_transport};
