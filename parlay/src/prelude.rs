//! Common imports for most parlay applications.

pub use crate::{
    assistant_message, developer_message, engine, engine_arc, parse_provider_id, system_message,
    tool_message, user_message,
};
pub use crate::{pl_messages, pl_msg};
pub use crate::{
    AbortSignal, BoxFuture, Capability, ChatEngine, ChatEngineBuilder, ChatError, ChatErrorKind,
    ChatErrorSource, ChatProvider, ChatRequest, ChatResponse, ConfirmToolCall, ConversationState,
    EnginePolicy, HistoryObserver, Message, MessageContent, MetadataMap, Middleware,
    MiddlewareCtx, MiddlewarePipeline, ProviderError, ProviderErrorKind, ProviderId,
    ProviderRegistry, RequestId, RetryPolicy, Role, StateMap, StopReason, StreamChunk,
    TokenUsage, Tool, ToolArgs, ToolCall, ToolCallMode, ToolDefinition, ToolError,
    ToolErrorDirective, ToolExecutionContext, ToolRegistry, TurnEvent, TurnOptions, TurnOutcome,
    TurnStream,
};
pub use crate::{
    MetricsObservabilityHooks, SafeMiddleware, SafeProviderHooks, TracingObservabilityHooks,
};
