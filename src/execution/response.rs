//! Response decoding interface

use crate::context::CallContext;
use crate::error::BoxError;
use crate::execution::http::WireResponse;
use async_trait::async_trait;
use std::future::Future;

/// Converts a wire response into the typed result of a call.
///
/// The decoder owns the response. Whether it reads the body to the end is up
/// to it; the endpoint closes whatever is left (unless buffered-stream mode
/// hands the body to the caller).
#[async_trait]
pub trait ResponseDecoder<Res>: Send + Sync {
    async fn decode(&self, ctx: &CallContext, response: WireResponse) -> Result<Res, BoxError>;
}

#[async_trait]
impl<Res, F, Fut> ResponseDecoder<Res> for F
where
    F: Fn(CallContext, WireResponse) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Res, BoxError>> + Send + 'static,
    Res: Send + 'static,
{
    async fn decode(&self, ctx: &CallContext, response: WireResponse) -> Result<Res, BoxError> {
        self(ctx.clone(), response).await
    }
}
