//! Metrics-based observability for engine turns, tool calls, and provider
//! attempts.
//!
//! ```rust
//! use pobserve::MetricsObservabilityHooks;
//! use pprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use pchat::{ChatError, Middleware, MiddlewareCtx, ToolErrorDirective};
use pcommon::BoxFuture;
use pprovider::{ChatResponse, ProviderError, ProviderId, ProviderOperationHooks, ToolCall};
use ptooling::ToolError;

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl Middleware for MetricsObservabilityHooks {
    fn name(&self) -> &str {
        "metrics"
    }

    fn on_request<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            metrics::counter!(
                "parlay_turn_request_total",
                "provider" => ctx.provider.to_string(),
                "model" => ctx.model.to_string()
            )
            .increment(1);
            Ok(())
        })
    }

    fn on_response<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        response: &'a ChatResponse,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            metrics::counter!(
                "parlay_turn_response_total",
                "provider" => ctx.provider.to_string(),
                "model" => ctx.model.to_string(),
                "stop_reason" => format!("{:?}", response.stop_reason)
            )
            .increment(1);
            metrics::counter!(
                "parlay_turn_tokens_total",
                "provider" => ctx.provider.to_string(),
                "direction" => "input"
            )
            .increment(response.usage.input_tokens as u64);
            metrics::counter!(
                "parlay_turn_tokens_total",
                "provider" => ctx.provider.to_string(),
                "direction" => "output"
            )
            .increment(response.usage.output_tokens as u64);
            Ok(())
        })
    }

    fn on_error<'a>(
        &'a self,
        ctx: &'a mut MiddlewareCtx<'_>,
        error: &'a ChatError,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            metrics::counter!(
                "parlay_turn_error_total",
                "provider" => ctx.provider.to_string(),
                "error_kind" => format!("{:?}", error.kind)
            )
            .increment(1);
        })
    }

    fn on_tool_call_start<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareCtx<'_>,
        call: &'a ToolCall,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            metrics::counter!(
                "parlay_tool_call_start_total",
                "tool_name" => call.name.clone()
            )
            .increment(1);
            Ok(())
        })
    }

    fn on_tool_call_end<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareCtx<'_>,
        call: &'a ToolCall,
        _output: &'a str,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            metrics::counter!(
                "parlay_tool_call_success_total",
                "tool_name" => call.name.clone()
            )
            .increment(1);
            Ok(())
        })
    }

    fn on_tool_call_error<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareCtx<'_>,
        call: &'a ToolCall,
        error: &'a ToolError,
    ) -> BoxFuture<'a, Option<ToolErrorDirective>> {
        Box::pin(async move {
            metrics::counter!(
                "parlay_tool_call_failure_total",
                "tool_name" => call.name.clone(),
                "error_kind" => format!("{:?}", error.kind)
            )
            .increment(1);
            None
        })
    }
}

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: &str, _attempt: u32) {
        metrics::counter!(
            "parlay_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "parlay_provider_retry_scheduled_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parlay_provider_retry_delay_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: ProviderId, operation: &str, attempts: u32) {
        metrics::counter!(
            "parlay_provider_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "parlay_provider_attempts_per_success",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "parlay_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "parlay_provider_attempts_per_failure",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}
