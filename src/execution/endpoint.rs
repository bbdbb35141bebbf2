//! Pipeline Executor
//!
//! One endpoint call runs these stages in order, each able to end the call
//! with an error:
//!
//! 1. derive a child context from the caller's context
//! 2. build the wire request (encode)
//! 3. fold the before-hooks
//! 4. round trip through the transport, raced against the context
//! 5. apply the stream policy
//! 6. fold the after-hooks
//! 7. decode
//!
//! The response body is bound to the child context, so reads by the decoder
//! or by the caller of a buffered stream end once the context does.
//!
//! Cleanup is scoped: on every exit the body is closed (default mode) and the
//! child context is cancelled, then finalizers run. In buffered-stream mode the
//! body close and the cancellation are handed to the caller through the
//! returned body.

use crate::context::CallContext;
use crate::error::EndpointError;
use crate::execution::finalizer::FinalizerGuard;
use crate::execution::hooks::{Finalizer, RequestHook, ResponseHook};
use crate::execution::http::body::CloseOnDrop;
use crate::execution::http::HttpTransport;
use crate::execution::request::CreateRequest;
use crate::execution::response::ResponseDecoder;
use async_trait::async_trait;
use std::sync::Arc;

/// A typed remote operation.
#[async_trait]
pub trait Endpoint<Req, Res>: Send + Sync {
    async fn call(&self, ctx: &CallContext, request: Req) -> Result<Res, EndpointError>;
}

/// Immutable configuration shared by every call of an endpoint.
pub(crate) struct EndpointConfig<Req, Res> {
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) create: Box<dyn CreateRequest<Req>>,
    pub(crate) decoder: Box<dyn ResponseDecoder<Res>>,
    pub(crate) before: Vec<Arc<dyn RequestHook>>,
    pub(crate) after: Vec<Arc<dyn ResponseHook>>,
    pub(crate) finalizers: Vec<Arc<dyn Finalizer>>,
    pub(crate) buffered_stream: bool,
}

impl<Req, Res> EndpointConfig<Req, Res> {
    async fn execute(
        &self,
        ctx: CallContext,
        request: Req,
        finalizers: &mut FinalizerGuard<'_>,
    ) -> Result<Res, EndpointError> {
        // 1. Build the wire request
        let mut wire_request = self
            .create
            .create(&ctx, request)
            .map_err(EndpointError::EncodingError)?;

        // 2. Before-hooks, in registration order
        let mut ctx = self
            .before
            .iter()
            .fold(ctx, |ctx, hook| hook.before_send(ctx, &mut wire_request));
        finalizers.observe(&ctx);

        // 3. Round trip
        tracing::debug!(target: "wirecall::endpoint", method=%wire_request.method(), url=%wire_request.url(), "sending request");
        let sent = tokio::select! {
            biased;
            done = ctx.done() => Err(EndpointError::from(done)),
            result = self.transport.round_trip(wire_request) => {
                result.map_err(EndpointError::TransportError)
            }
        };
        let mut response = sent?;
        tracing::debug!(target: "wirecall::endpoint", status=%response.status().as_u16(), content_length=%response.content_length(), "response received");

        ctx = ctx.with_response_metadata(response.headers().clone(), response.content_length());
        finalizers.observe(&ctx);
        response.body().watch_context(&ctx);

        // 4. Stream policy
        let _close_body = if self.buffered_stream {
            if let Some(token) = finalizers.hand_off_cancel() {
                response.body().cancel_context_on_close(token);
            }
            None
        } else {
            Some(CloseOnDrop(response.body().closer()))
        };

        // 5. After-hooks, in registration order
        let ctx = self
            .after
            .iter()
            .fold(ctx, |ctx, hook| hook.after_receive(ctx, &mut response));
        finalizers.observe(&ctx);
        tracing::trace!(target: "wirecall::endpoint", before_hooks=self.before.len(), after_hooks=self.after.len(), "hooks applied");

        // 6. Decode
        self.decoder
            .decode(&ctx, response)
            .await
            .map_err(EndpointError::DecodingError)
    }
}

/// The callable endpoint produced by a [`crate::Client`].
///
/// Cloning is cheap; clones share the client configuration. Concurrent calls
/// are independent of each other.
pub struct HttpEndpoint<Req, Res> {
    inner: Arc<EndpointConfig<Req, Res>>,
}

impl<Req, Res> HttpEndpoint<Req, Res> {
    pub(crate) fn new(inner: Arc<EndpointConfig<Req, Res>>) -> Self {
        Self { inner }
    }

    /// Whether response bodies are handed to the caller for closing.
    pub fn buffered_stream(&self) -> bool {
        self.inner.buffered_stream
    }
}

impl<Req, Res> Clone for HttpEndpoint<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Req, Res> std::fmt::Debug for HttpEndpoint<Req, Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEndpoint")
            .field("before_hooks", &self.inner.before.len())
            .field("after_hooks", &self.inner.after.len())
            .field("finalizers", &self.inner.finalizers.len())
            .field("buffered_stream", &self.inner.buffered_stream)
            .finish()
    }
}

#[async_trait]
impl<Req, Res> Endpoint<Req, Res> for HttpEndpoint<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    async fn call(&self, ctx: &CallContext, request: Req) -> Result<Res, EndpointError> {
        let ctx = ctx.child();
        let mut finalizers = FinalizerGuard::new(&self.inner.finalizers, &ctx);

        let result = self.inner.execute(ctx, request, &mut finalizers).await;
        finalizers.finish(result)
    }
}
