//! Hook and finalizer interfaces
//!
//! Before-hooks see the outgoing wire request, after-hooks the incoming wire
//! response. Both are folded in registration order: each receives the context
//! returned by the previous one and returns the context the next one sees.
//! Hooks cannot abort a call. Finalizers observe the outcome of a call once it
//! is settled and cannot change it.
//!
//! Plain closures implement all three traits.

use crate::context::CallContext;
use crate::error::EndpointError;
use crate::execution::http::{WireRequest, WireResponse};

/// Runs before the request is sent.
pub trait RequestHook: Send + Sync {
    fn before_send(&self, ctx: CallContext, request: &mut WireRequest) -> CallContext;
}

impl<F> RequestHook for F
where
    F: Fn(CallContext, &mut WireRequest) -> CallContext + Send + Sync,
{
    fn before_send(&self, ctx: CallContext, request: &mut WireRequest) -> CallContext {
        self(ctx, request)
    }
}

/// Runs after a response was received, before it is decoded.
pub trait ResponseHook: Send + Sync {
    fn after_receive(&self, ctx: CallContext, response: &mut WireResponse) -> CallContext;
}

impl<F> ResponseHook for F
where
    F: Fn(CallContext, &mut WireResponse) -> CallContext + Send + Sync,
{
    fn after_receive(&self, ctx: CallContext, response: &mut WireResponse) -> CallContext {
        self(ctx, response)
    }
}

/// Observes the settled outcome of a call. `error` is `None` only on success.
///
/// Finalizers are fire-and-forget: a panic is caught and logged, and the
/// remaining finalizers still run.
pub trait Finalizer: Send + Sync {
    fn finalize(&self, ctx: &CallContext, error: Option<&EndpointError>);
}

impl<F> Finalizer for F
where
    F: Fn(&CallContext, Option<&EndpointError>) + Send + Sync,
{
    fn finalize(&self, ctx: &CallContext, error: Option<&EndpointError>) {
        self(ctx, error)
    }
}

/// Correlation id stamped into the context by [`LoggingHooks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// A simple logging hook pair backed by `tracing` (no sensitive data).
///
/// Register it both as a before-hook and as an after-hook. Calls that do not
/// carry a [`RequestId`] yet get a fresh one.
#[derive(Clone, Default)]
pub struct LoggingHooks;

impl RequestHook for LoggingHooks {
    fn before_send(&self, ctx: CallContext, request: &mut WireRequest) -> CallContext {
        let ctx = if ctx.value::<RequestId>().is_some() {
            ctx
        } else {
            ctx.with_value(RequestId(uuid::Uuid::new_v4().to_string()))
        };
        let id = ctx.value::<RequestId>().map(|r| r.0.as_str()).unwrap_or("");
        tracing::debug!(target: "wirecall::http", request_id=%id, method=%request.method(), url=%request.url(), "sending request");
        ctx
    }
}

impl ResponseHook for LoggingHooks {
    fn after_receive(&self, ctx: CallContext, response: &mut WireResponse) -> CallContext {
        let id = ctx.value::<RequestId>().map(|r| r.0.as_str()).unwrap_or("");
        tracing::debug!(target: "wirecall::http", request_id=%id, status=%response.status().as_u16(), content_length=%response.content_length(), "response received");
        ctx
    }
}

/// Logs the outcome of every call.
#[derive(Clone, Default)]
pub struct LoggingFinalizer;

impl Finalizer for LoggingFinalizer {
    fn finalize(&self, ctx: &CallContext, error: Option<&EndpointError>) {
        let id = ctx.value::<RequestId>().map(|r| r.0.as_str()).unwrap_or("");
        match error {
            None => {
                tracing::debug!(target: "wirecall::http", request_id=%id, "call completed");
            }
            Some(err) => {
                let stage = err.stage().map(|s| s.to_string()).unwrap_or_default();
                tracing::warn!(target: "wirecall::http", request_id=%id, stage=%stage, err=%err, "call failed");
            }
        }
    }
}
