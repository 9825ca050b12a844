use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use futures_util::FutureExt;
use pchat::{ChatError, Middleware, MiddlewareCtx, ToolErrorDirective};
use pcommon::BoxFuture;
use pprovider::{ChatResponse, ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ptooling::ToolError;

/// Panic isolation for provider operation hooks: a panicking inner hook is
/// swallowed instead of poisoning the retry loop.
pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(provider, operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, operation, attempts)
        }));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, operation, attempts, error)
        }));
    }
}

/// Panic isolation for middleware. A panicking fallible hook degrades to
/// `Ok(())`, a panicking error hook to no directive, so a broken
/// observability layer can never take a turn down with it.
pub struct SafeMiddleware<M> {
    inner: M,
}

impl<M> SafeMiddleware<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> Middleware for SafeMiddleware<M>
where
    M: Middleware,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn on_request<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            AssertUnwindSafe(self.inner.on_request(ctx))
                .catch_unwind()
                .await
                .unwrap_or(Ok(()))
        })
    }

    fn on_response<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        response: &'a ChatResponse,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            AssertUnwindSafe(self.inner.on_response(ctx, response))
                .catch_unwind()
                .await
                .unwrap_or(Ok(()))
        })
    }

    fn on_error<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        error: &'a ChatError,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let _ = AssertUnwindSafe(self.inner.on_error(ctx, error))
                .catch_unwind()
                .await;
        })
    }

    fn on_tool_call_start<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        call: &'a ToolCall,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            AssertUnwindSafe(self.inner.on_tool_call_start(ctx, call))
                .catch_unwind()
                .await
                .unwrap_or(Ok(()))
        })
    }

    fn on_tool_call_end<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        call: &'a ToolCall,
        output: &'a str,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            AssertUnwindSafe(self.inner.on_tool_call_end(ctx, call, output))
                .catch_unwind()
                .await
                .unwrap_or(Ok(()))
        })
    }

    fn on_tool_call_error<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        call: &'a ToolCall,
        error: &'a ToolError,
    ) -> BoxFuture<'a, Option<ToolErrorDirective>> {
        Box::pin(async move {
            AssertUnwindSafe(self.inner.on_tool_call_error(ctx, call, error))
                .catch_unwind()
                .await
                .unwrap_or(None)
        })
    }
}
