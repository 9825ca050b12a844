//! Tracing-based observability for engine turns, tool calls, and provider
//! attempts.
//!
//! ```rust
//! use pobserve::TracingObservabilityHooks;
//! use pprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use pchat::{ChatError, Middleware, MiddlewareCtx, ToolErrorDirective};
use pcommon::BoxFuture;
use pprovider::{ChatResponse, ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ptooling::ToolError;

/// Middleware state key holding the turn's start time in unix millis.
pub(crate) const TURN_STARTED_KEY: &str = "pobserve.turn_started_ms";

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl Middleware for TracingObservabilityHooks {
    fn name(&self) -> &str {
        "tracing"
    }

    fn on_request<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            ctx.state
                .insert(TURN_STARTED_KEY.to_string(), serde_json::Value::from(now_ms()));
            tracing::info!(
                phase = "turn",
                event = "request",
                request_id = %ctx.request_id,
                provider = %ctx.provider,
                model = ctx.model,
                messages = ctx.messages.len()
            );
            Ok(())
        })
    }

    fn on_response<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        response: &'a ChatResponse,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let elapsed_ms = ctx
                .state
                .get(TURN_STARTED_KEY)
                .and_then(|value| value.as_u64())
                .map(|started| now_ms().saturating_sub(started));
            tracing::info!(
                phase = "turn",
                event = "response",
                request_id = %ctx.request_id,
                provider = %ctx.provider,
                model = ctx.model,
                stop_reason = ?response.stop_reason,
                tool_calls = response.tool_calls.len(),
                total_tokens = response.usage.total_tokens,
                elapsed_ms
            );
            Ok(())
        })
    }

    fn on_error<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        error: &'a ChatError,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            tracing::error!(
                phase = "turn",
                event = "error",
                request_id = %ctx.request_id,
                provider = %ctx.provider,
                model = ctx.model,
                error_kind = ?error.kind,
                error = %error
            );
        })
    }

    fn on_tool_call_start<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        call: &'a ToolCall,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            tracing::info!(
                phase = "tool",
                event = "call_start",
                request_id = %ctx.request_id,
                tool_name = %call.name,
                tool_call_id = %call.id
            );
            Ok(())
        })
    }

    fn on_tool_call_end<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        call: &'a ToolCall,
        output: &'a str,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            tracing::info!(
                phase = "tool",
                event = "call_end",
                request_id = %ctx.request_id,
                tool_name = %call.name,
                tool_call_id = %call.id,
                output_bytes = output.len()
            );
            Ok(())
        })
    }

    fn on_tool_call_error<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        call: &'a ToolCall,
        error: &'a ToolError,
    ) -> BoxFuture<'a, Option<ToolErrorDirective>> {
        Box::pin(async move {
            tracing::error!(
                phase = "tool",
                event = "call_error",
                request_id = %ctx.request_id,
                tool_name = %call.name,
                tool_call_id = %call.id,
                error_kind = ?error.kind,
                fatal = error.is_fatal(),
                error = %error
            );
            None
        })
    }
}

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.is_retryable(),
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.is_retryable(),
            error = %error
        );
    }
}
