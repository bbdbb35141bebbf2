//! Convenient re-exports
//!
//! ```rust,ignore
//! use wirecall::prelude::*;
//! ```

pub use crate::client::{Client, ClientBuilder, ClientOption};
pub use crate::codec::{
    JsonDecoder, StatusError, decode_json_response, encode_json_request,
    encode_json_request_with_headers,
};
pub use crate::context::{CallContext, Done, ResponseContentLength, ResponseHeaders};
pub use crate::error::{BoxError, CallStage, EndpointError};
pub use crate::execution::http::{
    BodyAborted, HeaderSource, HttpTransport, ResponseBody, WireRequest, WireResponse,
};
pub use crate::execution::{
    CreateRequest, Endpoint, Finalizer, HttpEndpoint, LoggingFinalizer, LoggingHooks,
    RequestEncoder, RequestHook, RequestId, ResponseDecoder, ResponseHook,
};
pub use crate::types::HttpConfig;
pub use reqwest::Method;
