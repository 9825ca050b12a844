//! Provider-agnostic model backends: data model, streaming, errors, retry.
//!
//! ```rust
//! use pprovider::{ChatRequest, Message, RetryPolicy};
//!
//! let request = ChatRequest::new("gpt-4o-mini", vec![Message::user("hi")]);
//! assert!(request.validate().is_ok());
//!
//! let policy = RetryPolicy::new(3);
//! assert_eq!(policy.max_attempts, 3);
//! ```

mod abort;
mod error;
mod model;
pub mod prelude;
mod provider;
mod registry;
mod resilience;
mod stream;

pub use abort::AbortSignal;
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    ChatRequest, ChatRequestBuilder, ChatResponse, ContentPart, Message, MessageContent,
    ProviderId, Role, StopReason, TokenUsage, ToolCall, ToolDefinition,
};
pub use provider::{Capability, ChatProvider, ProviderFuture};
pub use registry::ProviderRegistry;
pub use resilience::{
    NoopOperationHooks, ProviderOperationHooks, RetryPolicy, execute_with_retry,
};
pub use stream::{BoxedChunkStream, ChunkStream, StreamChunk, ToolCallDelta, VecChunkStream};
