//! # wirecall
//!
//! Typed HTTP client endpoints. A [`Client`] turns one remote operation into a
//! callable [`Endpoint`]: a function from a typed request to a typed response
//! or an [`EndpointError`]. Wire request construction, the transport round
//! trip, response decoding and resource cleanup stay inside the endpoint;
//! callers only supply an encoder and a decoder.
//!
//! Every call runs the same pipeline:
//!
//! encode → before-hooks → send → stream policy → after-hooks → decode
//!
//! with a per-call [`CallContext`] threaded through every stage and finalizers
//! observing the outcome exactly once.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use wirecall::prelude::*;
//!
//! #[derive(serde::Serialize)]
//! struct Lookup { id: u64 }
//!
//! #[derive(serde::Deserialize)]
//! struct Account { id: u64, name: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EndpointError> {
//!     let client = Client::new(
//!         Method::POST,
//!         "http://localhost:8080/accounts/lookup",
//!         encode_json_request::<Lookup>,
//!         JsonDecoder::<Account>::new(),
//!         [ClientOption::finalizer(LoggingFinalizer)],
//!     );
//!     let account = client
//!         .endpoint()
//!         .call(&CallContext::new(), Lookup { id: 7 })
//!         .await?;
//!     println!("{}", account.name);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming responses
//!
//! With `ClientOption::buffered_stream(true)` the decoder may return the
//! [`ResponseBody`] itself. The endpoint then leaves the body open and the call
//! context live until the caller closes (or drops) the body.

#![deny(unsafe_code)]

pub mod client;
pub mod codec;
pub mod context;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod prelude;
pub mod telemetry;
pub mod types;

pub use client::{Client, ClientBuilder, ClientOption};
pub use context::CallContext;
pub use error::{BoxError, CallStage, EndpointError};
pub use execution::http::{HttpTransport, ResponseBody, WireRequest, WireResponse};
pub use execution::{Endpoint, HttpEndpoint};
