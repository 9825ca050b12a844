//! Runtime registry of configured provider backends.
//!
//! ```rust
//! use pprovider::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! assert!(registry.is_empty());
//! ```

use std::sync::Arc;

use pcommon::Registry;

use crate::{ChatProvider, ProviderId};

#[derive(Default)]
pub struct ProviderRegistry {
    providers: Registry<ProviderId, Arc<dyn ChatProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P>(&mut self, provider: P)
    where
        P: ChatProvider + 'static,
    {
        self.register_arc(Arc::new(provider));
    }

    pub fn register_arc(&mut self, provider: Arc<dyn ChatProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn get(&self, provider_id: ProviderId) -> Option<Arc<dyn ChatProvider>> {
        self.providers.get(&provider_id).map(Arc::clone)
    }

    pub fn remove(&mut self, provider_id: ProviderId) -> Option<Arc<dyn ChatProvider>> {
        self.providers.remove(&provider_id)
    }

    pub fn contains(&self, provider_id: ProviderId) -> bool {
        self.providers.contains_key(&provider_id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Capability, ChatRequest, ChatResponse, Message, ProviderError, ProviderFuture, StopReason,
        TokenUsage,
    };

    #[derive(Debug)]
    struct FakeProvider;

    impl ChatProvider for FakeProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAi
        }

        fn default_model(&self, _capability: Option<Capability>) -> String {
            "gpt-4o-mini".to_string()
        }

        fn chat<'a>(
            &'a self,
            request: ChatRequest,
        ) -> ProviderFuture<'a, Result<ChatResponse, ProviderError>> {
            Box::pin(async move {
                request.validate()?;
                Ok(ChatResponse {
                    provider: ProviderId::OpenAi,
                    model: request.model,
                    content: "hello from provider".to_string(),
                    thinking: None,
                    tool_calls: Vec::new(),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                })
            })
        }
    }

    #[tokio::test]
    async fn registry_registers_and_returns_providers() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.is_empty());

        registry.register(FakeProvider);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(ProviderId::OpenAi));

        let provider = registry
            .get(ProviderId::OpenAi)
            .expect("provider should exist");

        let request = ChatRequest::new("gpt-4o-mini", vec![Message::user("hi")]);
        let response = provider.chat(request).await.expect("chat should work");

        assert_eq!(response.provider, ProviderId::OpenAi);
        assert_eq!(response.stop_reason, StopReason::EndTurn);

        let removed = registry.remove(ProviderId::OpenAi);
        assert!(removed.is_some());
        assert!(registry.is_empty());
    }
}
