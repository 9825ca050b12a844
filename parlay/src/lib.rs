//! Unified facade over the parlay workspace crates.
//!
//! This crate is designed to be the single dependency for most applications.
//! It re-exports the core parlay crates and provides convenience utilities
//! and macros for common message- and engine-building flows.

mod macros;

pub mod prelude;
pub mod util;

pub use pchat;
pub use pcommon;
pub use pobserve;
pub use pprovider;
pub use ptooling;

pub use pchat::{
    ChatEngine, ChatEngineBuilder, ChatError, ChatErrorKind, ChatErrorSource, ConfirmToolCall,
    ConversationState, EnginePolicy, FnConfirm, FnRequestTransform, FnResponseTransform,
    HistoryObserver, Middleware, MiddlewareCtx, MiddlewarePipeline, RequestTransform,
    ResponseTransform, StateMap, TOOL_CALL_DECLINED_NOTICE, ToolCallMode, ToolErrorDirective,
    TurnEvent, TurnOptions, TurnOutcome, TurnStream,
};
pub use pcommon::{BoxFuture, GenerationOptions, MetadataMap, RequestId};
pub use pobserve::{
    MetricsObservabilityHooks, SafeMiddleware, SafeProviderHooks, TracingObservabilityHooks,
};
pub use pprovider::{
    AbortSignal, BoxedChunkStream, Capability, ChatProvider, ChatRequest, ChatRequestBuilder,
    ChatResponse, ChunkStream, ContentPart, Message, MessageContent, NoopOperationHooks,
    ProviderError, ProviderErrorKind, ProviderFuture, ProviderId, ProviderOperationHooks,
    ProviderRegistry, RetryPolicy, Role, StopReason, StreamChunk, TokenUsage, ToolCall,
    ToolCallDelta, ToolDefinition, VecChunkStream, execute_with_retry,
};
pub use ptooling::{
    FunctionDecl, FunctionTool, Tool, ToolArgs, ToolDescriptor, ToolError, ToolErrorKind,
    ToolExecutionContext, ToolFuture, ToolRegistry, normalize_descriptor, tool_handler,
};

pub use util::{
    assistant_message, developer_message, engine, engine_arc, parse_provider_id, system_message,
    tool_message, user_message,
};
