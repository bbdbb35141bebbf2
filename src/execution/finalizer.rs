//! Finalizer Runner
//!
//! A [`FinalizerGuard`] is created when a call starts and settles exactly once:
//! either through [`FinalizerGuard::finish`] with the call result, or through
//! `Drop` when the call future is abandoned, in which case finalizers see
//! [`EndpointError::Cancelled`].
//!
//! The guard also owns the cancellation of the call's derived context. Unless
//! it was handed off to a buffered body, the context is cancelled before any
//! finalizer runs.

use crate::context::CallContext;
use crate::error::EndpointError;
use crate::execution::hooks::Finalizer;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, DropGuard};

pub(crate) struct FinalizerGuard<'a> {
    finalizers: &'a [Arc<dyn Finalizer>],
    ctx: Option<CallContext>,
    cancel: Option<DropGuard>,
    settled: bool,
}

impl<'a> FinalizerGuard<'a> {
    pub(crate) fn new(finalizers: &'a [Arc<dyn Finalizer>], ctx: &CallContext) -> Self {
        let mut guard = Self {
            finalizers,
            ctx: None,
            cancel: Some(ctx.cancellation_token().clone().drop_guard()),
            settled: false,
        };
        guard.observe(ctx);
        guard
    }

    /// Record the latest context of the call. No-op without finalizers.
    pub(crate) fn observe(&mut self, ctx: &CallContext) {
        if !self.finalizers.is_empty() {
            self.ctx = Some(ctx.clone());
        }
    }

    /// Take over the cancellation of the call context, e.g. to tie it to a body close.
    pub(crate) fn hand_off_cancel(&mut self) -> Option<CancellationToken> {
        self.cancel.take().map(DropGuard::disarm)
    }

    /// Run the finalizers with the call outcome and hand the outcome back unchanged.
    pub(crate) fn finish<T>(mut self, result: Result<T, EndpointError>) -> Result<T, EndpointError> {
        self.settled = true;
        self.run(result.as_ref().err());
        result
    }

    fn run(&mut self, error: Option<&EndpointError>) {
        drop(self.cancel.take());
        let Some(ctx) = self.ctx.take() else {
            return;
        };
        for (index, finalizer) in self.finalizers.iter().enumerate() {
            let outcome = catch_unwind(AssertUnwindSafe(|| finalizer.finalize(&ctx, error)));
            if let Err(payload) = outcome {
                tracing::warn!(
                    target: "wirecall::endpoint",
                    finalizer = index,
                    panic = %panic_message(payload.as_ref()),
                    "finalizer panicked"
                );
            }
        }
    }
}

impl Drop for FinalizerGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.settled = true;
            self.run(Some(&EndpointError::Cancelled));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
