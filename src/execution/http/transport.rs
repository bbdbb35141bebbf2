//! HTTP transport abstraction
//!
//! The pipeline only needs "perform one request, produce one response or an
//! error". Connection pooling, TLS, proxies and retries all belong to the
//! transport; `reqwest::Client` is the default implementation, and tests or
//! custom stacks can inject their own.

use crate::error::BoxError;
use crate::execution::http::body::WireResponse;
use async_trait::async_trait;
use std::sync::{Arc, LazyLock};

/// Outgoing wire request.
pub type WireRequest = reqwest::Request;

/// One HTTP round trip.
///
/// Implementations must be safe for concurrent use: a single transport is
/// shared by every call of every endpoint built on it. Errors are opaque to
/// the pipeline and surface as `EndpointError::TransportError`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn round_trip(&self, request: WireRequest) -> Result<WireResponse, BoxError>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn round_trip(&self, request: WireRequest) -> Result<WireResponse, BoxError> {
        let response = self.execute(request).await?;
        Ok(WireResponse::from(response))
    }
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn round_trip(&self, request: WireRequest) -> Result<WireResponse, BoxError> {
        (**self).round_trip(request).await
    }
}

static DEFAULT_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// Transport used when a client is built without one: a process-wide
/// `reqwest::Client` so endpoints share one connection pool.
pub fn default_transport() -> Arc<dyn HttpTransport> {
    Arc::new(DEFAULT_CLIENT.clone())
}
