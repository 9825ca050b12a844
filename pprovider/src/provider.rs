//! The provider contract every model backend implements.

use std::future::Future;
use std::pin::Pin;

use crate::{
    BoxedChunkStream, ChatRequest, ChatResponse, Message, ProviderError, ProviderId, ToolCall,
};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Model features the engine checks before issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Tools,
    Vision,
    Streaming,
    StructuredOutput,
}

pub trait ChatProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// The model used when a call does not name one, optionally the best
    /// default for a particular capability.
    fn default_model(&self, capability: Option<Capability>) -> String;

    /// Whether `model` supports `capability`. Defaults to permissive; backends
    /// with real capability tables override this.
    fn supports(&self, _model: &str, _capability: Capability) -> bool {
        true
    }

    fn chat<'a>(
        &'a self,
        request: ChatRequest,
    ) -> ProviderFuture<'a, Result<ChatResponse, ProviderError>>;

    /// Streaming is optional; the default declines with a capability error.
    fn stream<'a>(
        &'a self,
        _request: ChatRequest,
    ) -> ProviderFuture<'a, Result<BoxedChunkStream<'a>, ProviderError>> {
        let provider = self.id();
        Box::pin(async move {
            Err(ProviderError::capability("streaming is not supported by this provider")
                .with_provider(provider))
        })
    }

    /// How a tool result is folded back into the conversation. The default
    /// shape works for every supported backend; providers with quirky wire
    /// formats override it.
    fn format_tool_result(&self, call: &ToolCall, output: &str, is_error: bool) -> Message {
        Message::tool(call.id.clone(), output, is_error)
    }
}
