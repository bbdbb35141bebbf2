//! Execution layer
//!
//! - `request`: Request Builder
//! - `endpoint`: Pipeline Executor
//! - `finalizer`: Finalizer Runner
//! - `http`: transport, wire response and body lifecycle

pub mod endpoint;
pub(crate) mod finalizer;
pub mod hooks;
pub mod http;
pub mod request;
pub mod response;

pub use endpoint::{Endpoint, HttpEndpoint};
pub use hooks::{Finalizer, LoggingFinalizer, LoggingHooks, RequestHook, RequestId, ResponseHook};
pub use request::{CreateRequest, InvalidTarget, RequestBuilder, RequestEncoder};
pub use response::ResponseDecoder;
