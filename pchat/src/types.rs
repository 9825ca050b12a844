//! Engine call options, policies, and turn result types.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_core::Stream;
use pcommon::{BoxFuture, MetadataMap, RequestId};
use pprovider::{AbortSignal, RetryPolicy, StopReason, StreamChunk, TokenUsage, ToolCall};

use crate::ChatError;

/// How the engine treats tool calls requested by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolCallMode {
    /// Execute every requested call.
    #[default]
    Auto,
    /// Ask the configured gate before each call; declined calls are skipped
    /// and the model is told so.
    Confirm,
    /// Never execute; return the requested calls to the caller instead.
    DryRun,
}

/// Gate consulted per tool call in [`ToolCallMode::Confirm`].
pub trait ConfirmToolCall: Send + Sync {
    fn confirm<'a>(&'a self, call: &'a ToolCall) -> BoxFuture<'a, bool>;
}

pub struct FnConfirm<F> {
    gate: F,
}

impl<F> FnConfirm<F>
where
    F: Fn(&ToolCall) -> bool + Send + Sync,
{
    pub fn new(gate: F) -> Self {
        Self { gate }
    }
}

impl<F> ConfirmToolCall for FnConfirm<F>
where
    F: Fn(&ToolCall) -> bool + Send + Sync,
{
    fn confirm<'a>(&'a self, call: &'a ToolCall) -> BoxFuture<'a, bool> {
        let approved = (self.gate)(call);
        Box::pin(async move { approved })
    }
}

/// Per-call overrides layered over the engine's [`EnginePolicy`].
#[derive(Clone, Default)]
pub struct TurnOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub tool_mode: ToolCallMode,
    pub confirm: Option<Arc<dyn ConfirmToolCall>>,
    pub max_tool_rounds: Option<u32>,
    pub max_retries: Option<u32>,
    pub request_timeout: Option<Duration>,
    pub bypass_capability_check: bool,
    pub abort: Option<AbortSignal>,
    pub metadata: MetadataMap,
}

impl TurnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_tool_mode(mut self, tool_mode: ToolCallMode) -> Self {
        self.tool_mode = tool_mode;
        self
    }

    pub fn dry_run(self) -> Self {
        self.with_tool_mode(ToolCallMode::DryRun)
    }

    /// Switches to confirm mode with `gate` deciding each call.
    pub fn confirm_with<F>(mut self, gate: F) -> Self
    where
        F: Fn(&ToolCall) -> bool + Send + Sync + 'static,
    {
        self.tool_mode = ToolCallMode::Confirm;
        self.confirm = Some(Arc::new(FnConfirm::new(gate)));
        self
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: u32) -> Self {
        self.max_tool_rounds = Some(max_tool_rounds);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    pub fn bypass_capability_check(mut self) -> Self {
        self.bypass_capability_check = true;
        self
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Engine-level defaults applied when a call does not override them.
#[derive(Debug, Clone, PartialEq)]
pub struct EnginePolicy {
    pub max_tool_rounds: u32,
    pub retry: RetryPolicy,
    pub request_timeout: Option<Duration>,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            max_tool_rounds: 8,
            retry: RetryPolicy::default(),
            request_timeout: None,
        }
    }
}

impl EnginePolicy {
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.max_tool_rounds == 0 {
            return Err(ChatError::configuration(
                "max_tool_rounds must be at least 1",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ChatError::configuration("max_attempts must be at least 1"));
        }

        Ok(())
    }
}

/// Final result of one top-level engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub request_id: RequestId,
    pub content: String,
    pub thinking: Option<String>,
    /// Unexecuted calls; populated only in [`ToolCallMode::DryRun`].
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: StopReason,
    /// Usage accumulated across every tool round of the call.
    pub usage: TokenUsage,
    /// Number of tool rounds the call went through.
    pub rounds: u32,
}

/// Items yielded by [`crate::ChatEngine::stream`]: raw provider chunks,
/// unmodified, then one final outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    Chunk(StreamChunk),
    Completed(TurnOutcome),
}

pub type TurnStream<'a> = Pin<Box<dyn Stream<Item = Result<TurnEvent, ChatError>> + Send + 'a>>;
