//! Wire response and body lifecycle
//!
//! A [`ResponseBody`] is closed exactly once. Whoever closes first wins:
//! the pipeline (default mode), the caller via [`ResponseBody::close`]
//! (buffered-stream mode), or the drop of the last handle. Closing drops the
//! transport stream, releasing the connection, and in buffered-stream mode
//! cancels the call context that was deferred to the body.
//!
//! A body bound to a call context stops yielding data once that context ends:
//! the next read returns a single [`BodyAborted`] error and the body closes.

use crate::context::{CallContext, Done};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use reqwest::{StatusCode, Url, Version};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::time::Sleep;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Boxed byte stream produced by a transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

/// A body read was cut short because the call context ended.
///
/// Surfaces as the source of the [`io::Error`] returned by the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("response body read aborted: {0}")]
pub struct BodyAborted(pub Done);

impl BodyAborted {
    fn into_io(self) -> io::Error {
        match self.0 {
            Done::DeadlineExceeded => io::Error::new(io::ErrorKind::TimedOut, self),
            Done::Cancelled => io::Error::other(self),
        }
    }
}

/// Watches the end of a call context from inside `poll_next`.
struct ContextWatch {
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl ContextWatch {
    fn new(ctx: &CallContext) -> Self {
        Self {
            cancelled: Box::pin(ctx.cancellation_token().clone().cancelled_owned()),
            deadline: ctx.deadline().map(|d| Box::pin(tokio::time::sleep_until(d))),
        }
    }

    fn poll_done(&mut self, cx: &mut Context<'_>) -> Poll<Done> {
        if self.cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Done::Cancelled);
        }
        match self.deadline.as_mut() {
            Some(sleep) => sleep.as_mut().poll(cx).map(|()| Done::DeadlineExceeded),
            None => Poll::Pending,
        }
    }
}

struct BodyState {
    stream: ByteStream,
    watch: Option<ContextWatch>,
}

struct BodyShared {
    state: Mutex<Option<BodyState>>,
    closed: AtomicBool,
    cancel_on_close: OnceLock<CancellationToken>,
}

impl BodyShared {
    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let state = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(state);
        if let Some(token) = self.cancel_on_close.get() {
            token.cancel();
        }
        true
    }
}

impl Drop for BodyShared {
    fn drop(&mut self) {
        self.close();
    }
}

/// Streaming response body with exactly-once close.
pub struct ResponseBody {
    shared: Arc<BodyShared>,
    reported_closed: bool,
}

impl ResponseBody {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, io::Error>> + Send + 'static,
    {
        Self {
            shared: Arc::new(BodyShared {
                state: Mutex::new(Some(BodyState {
                    stream: Box::pin(stream),
                    watch: None,
                })),
                closed: AtomicBool::new(false),
                cancel_on_close: OnceLock::new(),
            }),
            reported_closed: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(futures::stream::empty())
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::new(futures::stream::iter([Ok(bytes)]))
    }

    /// Close the body. Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.shared.close()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Read the remaining body into memory.
    pub async fn bytes(mut self) -> Result<Bytes, io::Error> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    /// Read the remaining body as UTF-8 text.
    pub async fn text(self) -> Result<String, io::Error> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Adapt the body into an [`AsyncRead`], e.g. to copy a file download to disk.
    pub fn into_async_read(self) -> impl AsyncRead + Send + Unpin {
        tokio_util::io::StreamReader::new(self)
    }

    pub(crate) fn closer(&self) -> BodyCloser {
        BodyCloser(self.shared.clone())
    }

    /// Stop reads once `ctx` is cancelled or its deadline passes.
    pub(crate) fn watch_context(&self, ctx: &CallContext) {
        let mut state = self
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = state.as_mut() {
            state.watch = Some(ContextWatch::new(ctx));
        }
    }

    /// Defer cancellation of the call context to the close of this body.
    pub(crate) fn cancel_context_on_close(&self, token: CancellationToken) {
        if self.shared.cancel_on_close.set(token.clone()).is_err() {
            return;
        }
        // Closed before the token was attached: nothing left to defer.
        if self.is_closed() {
            token.cancel();
        }
    }
}

impl Stream for ResponseBody {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let mut guard = this
            .shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let done = match guard.as_mut() {
            Some(state) => match state.watch.as_mut().map(|w| w.poll_done(cx)) {
                Some(Poll::Ready(done)) => done,
                _ => return state.stream.as_mut().poll_next(cx),
            },
            None if !this.reported_closed => {
                this.reported_closed = true;
                return Poll::Ready(Some(Err(io::Error::other("read on closed response body"))));
            }
            None => return Poll::Ready(None),
        };
        drop(guard);
        this.shared.close();
        this.reported_closed = true;
        Poll::Ready(Some(Err(BodyAborted(done).into_io())))
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Pipeline-side handle that can close a body after it was moved into the decoder.
#[derive(Clone)]
pub(crate) struct BodyCloser(Arc<BodyShared>);

impl BodyCloser {
    pub(crate) fn close(&self) -> bool {
        self.0.close()
    }
}

/// Closes the body when dropped.
pub(crate) struct CloseOnDrop(pub(crate) BodyCloser);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Transport-level response handed to after-hooks and the decoder.
#[derive(Debug)]
pub struct WireResponse {
    status: StatusCode,
    version: Version,
    url: Option<Url>,
    headers: HeaderMap,
    content_length: i64,
    body: ResponseBody,
}

impl WireResponse {
    /// Build a response; the content length is taken from `Content-Length` when present.
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(-1);
        Self {
            status,
            version: Version::HTTP_11,
            url: None,
            headers,
            content_length,
            body,
        }
    }

    pub fn with_content_length(mut self, content_length: i64) -> Self {
        self.content_length = content_length;
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Content length in bytes, `-1` when unknown.
    pub fn content_length(&self) -> i64 {
        self.content_length
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    pub async fn bytes(self) -> Result<Bytes, io::Error> {
        self.body.bytes().await
    }

    pub async fn text(self) -> Result<String, io::Error> {
        self.body.text().await
    }
}

impl From<reqwest::Response> for WireResponse {
    fn from(response: reqwest::Response) -> Self {
        let status = response.status();
        let version = response.version();
        let url = response.url().clone();
        let headers = response.headers().clone();
        let content_length = response
            .content_length()
            .and_then(|len| i64::try_from(len).ok())
            .unwrap_or(-1);
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other));
        Self {
            status,
            version,
            url: Some(url),
            headers,
            content_length,
            body: ResponseBody::new(stream),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counted_body(chunks: Vec<&'static str>, drops: Arc<AtomicUsize>) -> ResponseBody {
        let counter = DropCounter(drops);
        let stream = futures::stream::iter(chunks).map(move |c| {
            let _keep = &counter;
            Ok::<_, io::Error>(Bytes::from_static(c.as_bytes()))
        });
        ResponseBody::new(stream)
    }

    #[tokio::test]
    async fn close_is_exactly_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let body = counted_body(vec!["a"], drops.clone());
        let closer = body.closer();

        assert!(closer.close());
        assert!(!body.close());
        assert!(!closer.close());
        assert!(body.is_closed());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn read_after_close_errors_once() {
        let mut body = ResponseBody::from_bytes("payload");
        body.close();
        let first = body.next().await.expect("error item");
        assert!(first.is_err());
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn deferred_cancel_fires_on_close_only() {
        let token = CancellationToken::new();
        let body = ResponseBody::from_bytes("x");
        body.cancel_context_on_close(token.clone());
        assert!(!token.is_cancelled());
        body.close();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn dropping_last_handle_closes() {
        let token = CancellationToken::new();
        let drops = Arc::new(AtomicUsize::new(0));
        let body = counted_body(vec!["a", "b"], drops.clone());
        body.cancel_context_on_close(token.clone());
        drop(body);
        assert!(token.is_cancelled());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn async_read_yields_all_chunks() {
        let drops = Arc::new(AtomicUsize::new(0));
        let body = counted_body(vec!["hello ", "world"], drops);
        let mut reader = body.into_async_read();
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello world");
    }

    fn stalling_body(first: &'static str) -> ResponseBody {
        let stream = futures::stream::iter([Ok::<_, io::Error>(Bytes::from_static(first.as_bytes()))])
            .chain(futures::stream::pending());
        ResponseBody::new(stream)
    }

    fn aborted_by(err: &io::Error) -> Option<Done> {
        err.get_ref()
            .and_then(|e| e.downcast_ref::<BodyAborted>())
            .map(|aborted| aborted.0)
    }

    #[tokio::test]
    async fn watched_body_stops_when_context_is_cancelled() {
        let ctx = CallContext::new();
        let mut body = stalling_body("a");
        body.watch_context(&ctx);

        assert_eq!(&body.next().await.unwrap().unwrap()[..], b"a");
        ctx.cancel();

        let err = body.next().await.expect("error item").unwrap_err();
        assert_eq!(aborted_by(&err), Some(Done::Cancelled));
        assert!(body.is_closed());
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn watched_body_stops_at_deadline() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(20));
        let token = ctx.cancellation_token().clone();
        let body = stalling_body("{");
        body.watch_context(&ctx);
        body.cancel_context_on_close(token.clone());

        let err = body.text().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert_eq!(aborted_by(&err), Some(Done::DeadlineExceeded));
        assert!(token.is_cancelled());
    }

    #[test]
    fn content_length_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, "42".parse().unwrap());
        let resp = WireResponse::new(StatusCode::OK, headers, ResponseBody::empty());
        assert_eq!(resp.content_length(), 42);

        let resp = WireResponse::new(StatusCode::OK, HeaderMap::new(), ResponseBody::empty());
        assert_eq!(resp.content_length(), -1);
    }
}
