//! Common `pprovider` imports for downstream crates.

pub use crate::{
    AbortSignal, BoxedChunkStream, Capability, ChatProvider, ChatRequest, ChatRequestBuilder,
    ChatResponse, ChunkStream, ContentPart, Message, MessageContent, NoopOperationHooks,
    ProviderError, ProviderErrorKind, ProviderFuture, ProviderId, ProviderOperationHooks,
    ProviderRegistry, RetryPolicy, Role, StopReason, StreamChunk, TokenUsage, ToolCall,
    ToolCallDelta, ToolDefinition, VecChunkStream, execute_with_retry,
};
pub use pcommon::{BoxFuture, MetadataMap};
