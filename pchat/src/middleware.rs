//! Middleware pipeline wrapped around every engine call.
//!
//! Hooks nest like an onion: `on_request` runs in registration order,
//! `on_response` and `on_error` in reverse registration order, so the first
//! middleware registered is the outermost layer. Tool hooks run in
//! registration order around each tool call. `on_error` fires exactly once
//! per top-level call, no matter where the failure happened.

use std::collections::HashMap;
use std::sync::Arc;

use pcommon::{BoxFuture, RequestId};
use pprovider::{ChatResponse, Message, ProviderId, ToolCall};
use ptooling::ToolError;

use crate::{ChatError, TurnOptions};

/// Scratch space shared by all hooks of one call; a middleware can stash a
/// value in `on_request` and read it back in `on_response`.
pub type StateMap = HashMap<String, serde_json::Value>;

/// Per-call view handed to every hook. `messages` is the live history:
/// mutations made in `on_request` are persisted and sent to the provider.
pub struct MiddlewareCtx<'a> {
    pub request_id: RequestId,
    pub provider: ProviderId,
    pub model: &'a str,
    pub messages: &'a mut Vec<Message>,
    pub options: &'a TurnOptions,
    pub state: &'a mut StateMap,
}

/// What a middleware wants done with a failed tool call. Absent a directive,
/// the engine falls back to the fatal/non-fatal default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorDirective {
    /// End the turn with the error even if it is non-fatal.
    Stop,
    /// Fold the error into the conversation as a tool message even if it is
    /// fatal.
    Continue,
    /// Re-run the handler once; a second failure gets the default policy
    /// without consulting the hook again.
    Retry,
}

pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;

    fn on_request<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareCtx<'_>,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async { Ok(()) })
    }

    fn on_response<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareCtx<'_>,
        _response: &'a ChatResponse,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async { Ok(()) })
    }

    fn on_error<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareCtx<'_>,
        _error: &'a ChatError,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }

    fn on_tool_call_start<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareCtx<'_>,
        _call: &'a ToolCall,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async { Ok(()) })
    }

    fn on_tool_call_end<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareCtx<'_>,
        _call: &'a ToolCall,
        _output: &'a str,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async { Ok(()) })
    }

    fn on_tool_call_error<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareCtx<'_>,
        _call: &'a ToolCall,
        _error: &'a ToolError,
    ) -> BoxFuture<'a, Option<ToolErrorDirective>> {
        Box::pin(async { None })
    }
}

#[derive(Default, Clone)]
pub struct MiddlewarePipeline {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.layers.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub async fn run_on_request(&self, ctx: &mut MiddlewareCtx<'_>) -> Result<(), ChatError> {
        for middleware in &self.layers {
            middleware.on_request(ctx).await?;
        }

        Ok(())
    }

    pub async fn run_on_response(
        &self,
        ctx: &mut MiddlewareCtx<'_>,
        response: &ChatResponse,
    ) -> Result<(), ChatError> {
        for middleware in self.layers.iter().rev() {
            middleware.on_response(ctx, response).await?;
        }

        Ok(())
    }

    pub async fn run_on_error(&self, ctx: &mut MiddlewareCtx<'_>, error: &ChatError) {
        for middleware in self.layers.iter().rev() {
            middleware.on_error(ctx, error).await;
        }
    }

    pub async fn run_on_tool_call_start(
        &self,
        ctx: &mut MiddlewareCtx<'_>,
        call: &ToolCall,
    ) -> Result<(), ChatError> {
        for middleware in &self.layers {
            middleware.on_tool_call_start(ctx, call).await?;
        }

        Ok(())
    }

    pub async fn run_on_tool_call_end(
        &self,
        ctx: &mut MiddlewareCtx<'_>,
        call: &ToolCall,
        output: &str,
    ) -> Result<(), ChatError> {
        for middleware in &self.layers {
            middleware.on_tool_call_end(ctx, call, output).await?;
        }

        Ok(())
    }

    /// Every hook runs; the first directive returned wins.
    pub async fn run_on_tool_call_error(
        &self,
        ctx: &mut MiddlewareCtx<'_>,
        call: &ToolCall,
        error: &ToolError,
    ) -> Option<ToolErrorDirective> {
        let mut directive = None;

        for middleware in &self.layers {
            let returned = middleware.on_tool_call_error(ctx, call, error).await;
            if directive.is_none() {
                directive = returned;
            }
        }

        directive
    }
}
