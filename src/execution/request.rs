//! Request Builder
//!
//! Turns a typed request value into a [`WireRequest`]. A [`RequestBuilder`]
//! allocates a bare request for a method and target, then lets a
//! [`RequestEncoder`] fill in body and headers. Callers that need full control
//! over request construction implement [`CreateRequest`] directly.

use crate::context::CallContext;
use crate::error::BoxError;
use crate::execution::http::WireRequest;
use reqwest::{Method, Url};
use thiserror::Error;

/// Populates a bare wire request from a typed request value.
pub trait RequestEncoder<Req>: Send + Sync {
    fn encode(
        &self,
        ctx: &CallContext,
        request: &mut WireRequest,
        value: Req,
    ) -> Result<(), BoxError>;
}

impl<Req, F> RequestEncoder<Req> for F
where
    F: Fn(&CallContext, &mut WireRequest, Req) -> Result<(), BoxError> + Send + Sync,
{
    fn encode(
        &self,
        ctx: &CallContext,
        request: &mut WireRequest,
        value: Req,
    ) -> Result<(), BoxError> {
        self(ctx, request, value)
    }
}

/// Builds the whole wire request from a typed request value.
pub trait CreateRequest<Req>: Send + Sync {
    fn create(&self, ctx: &CallContext, value: Req) -> Result<WireRequest, BoxError>;
}

impl<Req, F> CreateRequest<Req> for F
where
    F: Fn(&CallContext, Req) -> Result<WireRequest, BoxError> + Send + Sync,
{
    fn create(&self, ctx: &CallContext, value: Req) -> Result<WireRequest, BoxError> {
        self(ctx, value)
    }
}

/// The configured target could not be turned into a request URL.
#[derive(Debug, Error)]
#[error("invalid request target '{target}': {reason}")]
pub struct InvalidTarget {
    pub target: String,
    pub reason: String,
}

/// Method + target + encoder.
///
/// The target is parsed on every call so a malformed target surfaces as an
/// encoding failure of that call rather than at construction.
pub struct RequestBuilder<E> {
    method: Method,
    target: String,
    encoder: E,
}

impl<E> RequestBuilder<E> {
    pub fn new(method: Method, target: impl Into<String>, encoder: E) -> Self {
        Self {
            method,
            target: target.into(),
            encoder,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl<Req, E> CreateRequest<Req> for RequestBuilder<E>
where
    E: RequestEncoder<Req>,
{
    fn create(&self, ctx: &CallContext, value: Req) -> Result<WireRequest, BoxError> {
        let url = Url::parse(&self.target).map_err(|e| InvalidTarget {
            target: self.target.clone(),
            reason: e.to_string(),
        })?;
        let mut request = WireRequest::new(self.method.clone(), url);
        self.encoder.encode(ctx, &mut request, value)?;
        Ok(request)
    }
}
