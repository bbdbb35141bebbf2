//! Client construction
//!
//! A [`Client`] owns everything needed to produce an endpoint: the transport,
//! the request builder, the decoder, the hook and finalizer lists and the
//! buffered-stream flag. Options are applied once, in order, at construction;
//! the client is immutable afterwards and shared by every call.
//!
//! # Example
//!
//! ```rust,ignore
//! use wirecall::prelude::*;
//!
//! let client = Client::new(
//!     Method::POST,
//!     "http://localhost:8080/users",
//!     encode_json_request::<CreateUser>,
//!     JsonDecoder::<User>::new(),
//!     [
//!         ClientOption::before(LoggingHooks),
//!         ClientOption::after(LoggingHooks),
//!         ClientOption::finalizer(LoggingFinalizer),
//!     ],
//! );
//! let user = client.endpoint().call(&CallContext::new(), request).await?;
//! ```

use crate::error::EndpointError;
use crate::execution::endpoint::{EndpointConfig, HttpEndpoint};
use crate::execution::hooks::{Finalizer, RequestHook, ResponseHook};
use crate::execution::http::{HttpTransport, build_http_client, default_transport};
use crate::execution::request::{CreateRequest, RequestBuilder, RequestEncoder};
use crate::execution::response::ResponseDecoder;
use crate::types::HttpConfig;
use reqwest::Method;
use std::sync::Arc;

/// Construction-time client option.
#[derive(Clone)]
pub enum ClientOption {
    /// Replace the transport. The last one wins.
    Transport(Arc<dyn HttpTransport>),
    /// Append a before-hook.
    Before(Arc<dyn RequestHook>),
    /// Append an after-hook.
    After(Arc<dyn ResponseHook>),
    /// Append a finalizer.
    Finalizer(Arc<dyn Finalizer>),
    /// Hand response bodies, and the cancellation of the call context, to the caller.
    BufferedStream(bool),
}

impl ClientOption {
    pub fn set_transport(transport: impl HttpTransport + 'static) -> Self {
        Self::Transport(Arc::new(transport))
    }

    pub fn before(hook: impl RequestHook + 'static) -> Self {
        Self::Before(Arc::new(hook))
    }

    pub fn after(hook: impl ResponseHook + 'static) -> Self {
        Self::After(Arc::new(hook))
    }

    pub fn finalizer(finalizer: impl Finalizer + 'static) -> Self {
        Self::Finalizer(Arc::new(finalizer))
    }

    pub fn buffered_stream(buffered: bool) -> Self {
        Self::BufferedStream(buffered)
    }
}

impl std::fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(_) => f.write_str("Transport(..)"),
            Self::Before(_) => f.write_str("Before(..)"),
            Self::After(_) => f.write_str("After(..)"),
            Self::Finalizer(_) => f.write_str("Finalizer(..)"),
            Self::BufferedStream(b) => f.debug_tuple("BufferedStream").field(b).finish(),
        }
    }
}

/// Typed HTTP client for one remote operation.
pub struct Client<Req, Res> {
    inner: Arc<EndpointConfig<Req, Res>>,
}

impl<Req, Res> Client<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Client that sends `method` requests to `target`, with `encoder` filling in
    /// the request and `decoder` producing the result.
    pub fn new<E, D>(
        method: Method,
        target: impl Into<String>,
        encoder: E,
        decoder: D,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Self
    where
        E: RequestEncoder<Req> + 'static,
        D: ResponseDecoder<Res> + 'static,
    {
        Self::new_explicit(RequestBuilder::new(method, target, encoder), decoder, options)
    }

    /// Client whose wire requests are built entirely by `create`.
    pub fn new_explicit<C, D>(
        create: C,
        decoder: D,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Self
    where
        C: CreateRequest<Req> + 'static,
        D: ResponseDecoder<Res> + 'static,
    {
        let mut transport = None;
        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut finalizers = Vec::new();
        let mut buffered_stream = false;

        for option in options {
            match option {
                ClientOption::Transport(t) => transport = Some(t),
                ClientOption::Before(hook) => before.push(hook),
                ClientOption::After(hook) => after.push(hook),
                ClientOption::Finalizer(f) => finalizers.push(f),
                ClientOption::BufferedStream(b) => buffered_stream = b,
            }
        }

        Self {
            inner: Arc::new(EndpointConfig {
                transport: transport.unwrap_or_else(default_transport),
                create: Box::new(create),
                decoder: Box::new(decoder),
                before,
                after,
                finalizers,
                buffered_stream,
            }),
        }
    }
}

impl<Req, Res> Client<Req, Res> {
    /// The callable endpoint. Every endpoint of a client shares its configuration.
    pub fn endpoint(&self) -> HttpEndpoint<Req, Res> {
        HttpEndpoint::new(self.inner.clone())
    }
}

impl<Req, Res> Clone for Client<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Req, Res> std::fmt::Debug for Client<Req, Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("before_hooks", &self.inner.before.len())
            .field("after_hooks", &self.inner.after.len())
            .field("finalizers", &self.inner.finalizers.len())
            .field("buffered_stream", &self.inner.buffered_stream)
            .finish()
    }
}

/// Fluent construction of a [`Client`].
///
/// An explicit transport takes precedence over `http_config`; with neither,
/// the shared default transport is used.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    http_config: Option<HttpConfig>,
    options: Vec<ClientOption>,
}

impl ClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the default `reqwest` transport from this configuration.
    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = Some(config);
        self
    }

    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.options.push(ClientOption::set_transport(transport));
        self
    }

    pub fn before(mut self, hook: impl RequestHook + 'static) -> Self {
        self.options.push(ClientOption::before(hook));
        self
    }

    pub fn after(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.options.push(ClientOption::after(hook));
        self
    }

    pub fn finalizer(mut self, finalizer: impl Finalizer + 'static) -> Self {
        self.options.push(ClientOption::finalizer(finalizer));
        self
    }

    pub fn buffered_stream(mut self, buffered: bool) -> Self {
        self.options.push(ClientOption::buffered_stream(buffered));
        self
    }

    pub fn option(mut self, option: ClientOption) -> Self {
        self.options.push(option);
        self
    }

    /// Build a client for `method` + `target` with the given encoder and decoder.
    pub fn build<Req, Res, E, D>(
        self,
        method: Method,
        target: impl Into<String>,
        encoder: E,
        decoder: D,
    ) -> Result<Client<Req, Res>, EndpointError>
    where
        Req: Send + 'static,
        Res: Send + 'static,
        E: RequestEncoder<Req> + 'static,
        D: ResponseDecoder<Res> + 'static,
    {
        self.build_explicit(RequestBuilder::new(method, target, encoder), decoder)
    }

    /// Build a client whose wire requests are produced by `create`.
    pub fn build_explicit<Req, Res, C, D>(
        self,
        create: C,
        decoder: D,
    ) -> Result<Client<Req, Res>, EndpointError>
    where
        Req: Send + 'static,
        Res: Send + 'static,
        C: CreateRequest<Req> + 'static,
        D: ResponseDecoder<Res> + 'static,
    {
        let options = self.resolve_options()?;
        Ok(Client::new_explicit(create, decoder, options))
    }

    fn resolve_options(self) -> Result<Vec<ClientOption>, EndpointError> {
        let mut options = self.options;
        let has_transport = options
            .iter()
            .any(|o| matches!(o, ClientOption::Transport(_)));
        if let (Some(config), false) = (self.http_config, has_transport) {
            let client = build_http_client(&config)?;
            tracing::debug!(target: "wirecall::client", timeout=?config.timeout, proxy=config.proxy.is_some(), "built transport from http config");
            options.insert(0, ClientOption::set_transport(client));
        }
        Ok(options)
    }
}

static_assertions::assert_impl_all!(Client<String, String>: Send, Sync, Clone);
static_assertions::assert_impl_all!(HttpEndpoint<String, String>: Send, Sync, Clone);
static_assertions::assert_impl_all!(ClientOption: Send, Sync);
