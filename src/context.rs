//! Per-call execution context
//!
//! A [`CallContext`] is the cancellable scope threaded through every stage of
//! an endpoint call. It carries:
//! - a cancellation token (cancelling a parent cancels every derived child)
//! - an optional deadline
//! - caller-supplied typed values, copied on write so hooks can enrich the
//!   context without affecting other calls
//!
//! After the transport round trip completes the pipeline stores
//! [`ResponseHeaders`] and [`ResponseContentLength`] in the context, so
//! after-hooks, decoders and finalizers can read response metadata.

use crate::error::EndpointError;
use reqwest::header::HeaderMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type ValueMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Response headers of the round trip, available once the transport returned.
#[derive(Debug, Clone)]
pub struct ResponseHeaders(pub HeaderMap);

/// Response content length; `-1` when the transport did not know it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseContentLength(pub i64);

/// Why a context stopped being live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Done {
    Cancelled,
    DeadlineExceeded,
}

impl std::fmt::Display for Done {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Done::Cancelled => f.write_str("call cancelled"),
            Done::DeadlineExceeded => f.write_str("call deadline exceeded"),
        }
    }
}

impl From<Done> for EndpointError {
    fn from(done: Done) -> Self {
        match done {
            Done::Cancelled => EndpointError::Cancelled,
            Done::DeadlineExceeded => EndpointError::DeadlineExceeded,
        }
    }
}

/// Cancellable per-call scope with typed values.
#[derive(Clone)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    values: Arc<ValueMap>,
}

impl CallContext {
    /// A fresh root context: never cancelled unless its token is, no deadline, no values.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            values: Arc::new(HashMap::new()),
        }
    }

    /// Replace the cancellation token, e.g. to tie calls to an application shutdown token.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Set a deadline. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Set a deadline `timeout` from now. An earlier existing deadline is kept.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Store a typed value, replacing any previous value of the same type.
    pub fn with_value<T: Any + Send + Sync>(mut self, value: T) -> Self {
        let mut values = (*self.values).clone();
        values.insert(TypeId::of::<T>(), Arc::new(value));
        self.values = Arc::new(values);
        self
    }

    /// Look up a typed value.
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Derive a child scope. Cancelling `self` cancels the child; cancelling the
    /// child leaves `self` untouched. Values and deadline are inherited.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            values: self.values.clone(),
        }
    }

    /// Cancel this scope and every scope derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is no longer live, `None` while it still is.
    pub fn done_reason(&self) -> Option<Done> {
        if self.token.is_cancelled() {
            Some(Done::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(Done::DeadlineExceeded)
        } else {
            None
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.done_reason().is_some()
    }

    /// Resolves once the token is cancelled or the deadline passes.
    pub async fn done(&self) -> Done {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Done::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Done::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                Done::Cancelled
            }
        }
    }

    /// Response headers, present once a response was received.
    pub fn response_headers(&self) -> Option<&HeaderMap> {
        self.value::<ResponseHeaders>().map(|h| &h.0)
    }

    /// Response content length (`-1` when unknown), present once a response was received.
    pub fn response_content_length(&self) -> Option<i64> {
        self.value::<ResponseContentLength>().map(|l| l.0)
    }

    pub(crate) fn with_response_metadata(self, headers: HeaderMap, content_length: i64) -> Self {
        self.with_value(ResponseHeaders(headers))
            .with_value(ResponseContentLength(content_length))
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("cancelled", &self.token.is_cancelled())
            .field("deadline", &self.deadline)
            .field("values", &self.values.len())
            .finish()
    }
}
