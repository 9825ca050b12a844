//! The chat engine: provider calls, the tool loop, and turn orchestration.
//!
//! One engine owns one conversation. A call to [`ChatEngine::ask`] or
//! [`ChatEngine::stream`] runs a full turn: user message in, zero or more
//! tool rounds, one final assistant answer out. Both paths share the same
//! preflight checks, retry handling, middleware hooks, and tool loop; the
//! streaming path additionally forwards every provider chunk as it arrives.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pchat::{ChatEngine, TurnOptions};
//! use pprovider::{
//!     Capability, ChatProvider, ChatRequest, ChatResponse, ProviderError, ProviderFuture,
//!     ProviderId, StopReason, TokenUsage,
//! };
//!
//! struct EchoProvider;
//!
//! impl ChatProvider for EchoProvider {
//!     fn id(&self) -> ProviderId {
//!         ProviderId::Ollama
//!     }
//!
//!     fn default_model(&self, _capability: Option<Capability>) -> String {
//!         "llama3.2".to_string()
//!     }
//!
//!     fn chat<'a>(
//!         &'a self,
//!         request: ChatRequest,
//!     ) -> ProviderFuture<'a, Result<ChatResponse, ProviderError>> {
//!         Box::pin(async move {
//!             Ok(ChatResponse {
//!                 provider: ProviderId::Ollama,
//!                 model: request.model,
//!                 content: request.messages[0].text(),
//!                 thinking: None,
//!                 tool_calls: Vec::new(),
//!                 stop_reason: StopReason::EndTurn,
//!                 usage: TokenUsage::default(),
//!             })
//!         })
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut engine = ChatEngine::builder(EchoProvider)
//!     .build()
//!     .expect("engine builds");
//! let outcome = engine
//!     .ask("hello", TurnOptions::default())
//!     .await
//!     .expect("turn completes");
//! assert_eq!(outcome.content, "hello");
//! # }
//! ```

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures_timer::Delay;
use futures_util::StreamExt;
use futures_util::future::{Either, select};
use pcommon::RequestId;
use pprovider::{
    Capability, ChatProvider, ChatRequest, ChatResponse, Message, MessageContent,
    NoopOperationHooks, ProviderError, ProviderOperationHooks, RetryPolicy, TokenUsage,
    execute_with_retry,
};
use ptooling::{Tool, ToolDescriptor, ToolError, ToolExecutionContext, ToolRegistry};

use crate::stream::{AbortOnDrop, StreamAccumulator};
use crate::toolcall::execute_tool_call;
use crate::{
    ChatError, ConversationState, EnginePolicy, FnRequestTransform, FnResponseTransform,
    HistoryObserver, Middleware, MiddlewareCtx, MiddlewarePipeline, RequestTransform,
    ResponseTransform, StateMap, ToolCallMode, TurnEvent, TurnOptions, TurnOutcome, TurnStream,
};

pub struct ChatEngine {
    provider: Arc<dyn ChatProvider>,
    history: ConversationState,
    tools: ToolRegistry,
    middlewares: MiddlewarePipeline,
    request_transforms: Vec<Arc<dyn RequestTransform>>,
    response_transforms: Vec<Arc<dyn ResponseTransform>>,
    observers: Vec<Arc<dyn HistoryObserver>>,
    operation_hooks: Arc<dyn ProviderOperationHooks>,
    policy: EnginePolicy,
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ChatEngine {
    pub fn builder<P>(provider: P) -> ChatEngineBuilder
    where
        P: ChatProvider + 'static,
    {
        ChatEngineBuilder::new(Arc::new(provider))
    }

    pub fn builder_arc(provider: Arc<dyn ChatProvider>) -> ChatEngineBuilder {
        ChatEngineBuilder::new(provider)
    }

    pub fn history(&self) -> &ConversationState {
        &self.history
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn add_tool<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.register(tool);
    }

    pub fn add_tool_descriptor(&mut self, descriptor: ToolDescriptor) -> Result<(), ChatError> {
        self.tools.register_descriptor(descriptor)?;
        Ok(())
    }

    /// Runs one buffered turn and returns the final outcome.
    pub async fn ask(
        &mut self,
        input: impl Into<MessageContent>,
        options: TurnOptions,
    ) -> Result<TurnOutcome, ChatError> {
        let request_id = RequestId::next();
        let mut state = StateMap::new();

        match self
            .run_buffered_turn(request_id, input.into(), &options, &mut state)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                self.report_error(request_id, &options, &mut state, &error)
                    .await;
                Err(error)
            }
        }
    }

    async fn run_buffered_turn(
        &mut self,
        request_id: RequestId,
        content: MessageContent,
        options: &TurnOptions,
        state: &mut StateMap,
    ) -> Result<TurnOutcome, ChatError> {
        let model = self.resolve_model(options);
        self.preflight(&model, &content, options, false)?;
        self.append_message(Message::user(content))?;

        let max_tool_rounds = options
            .max_tool_rounds
            .unwrap_or(self.policy.max_tool_rounds);
        let mut usage = TokenUsage::default();
        let mut rounds = 0;

        loop {
            {
                let mut ctx = MiddlewareCtx {
                    request_id,
                    provider: self.provider.id(),
                    model: &model,
                    messages: self.history.live_mut(),
                    options,
                    state,
                };
                self.middlewares.run_on_request(&mut ctx).await?;
            }

            let outbound = self
                .apply_request_transforms(self.history.messages().to_vec())
                .await;
            let request = self.build_request(&model, outbound, options, false);
            let mut response = self.call_chat(request, options).await?;

            usage.absorb(&response.usage);
            response.content = self.apply_response_transforms(response.content).await;

            self.append_message(
                Message::assistant(response.content.clone())
                    .with_tool_calls(response.tool_calls.clone()),
            )?;

            if !response.tool_calls.is_empty() && options.tool_mode != ToolCallMode::DryRun {
                rounds += 1;
                if rounds > max_tool_rounds {
                    return Err(ChatError::tool_loop_limit(max_tool_rounds));
                }

                for call in &response.tool_calls {
                    let executed = {
                        let mut ctx = MiddlewareCtx {
                            request_id,
                            provider: self.provider.id(),
                            model: &model,
                            messages: self.history.live_mut(),
                            options,
                            state,
                        };
                        execute_tool_call(
                            &self.tools,
                            self.provider.as_ref(),
                            &self.middlewares,
                            &mut ctx,
                            call,
                        )
                        .await?
                    };

                    if let Some(message) = executed {
                        self.append_message(message)?;
                    }
                }

                continue;
            }

            let outcome = TurnOutcome {
                request_id,
                content: response.content.clone(),
                thinking: response.thinking.clone(),
                tool_calls: if options.tool_mode == ToolCallMode::DryRun {
                    response.tool_calls.clone()
                } else {
                    Vec::new()
                },
                stop_reason: response.stop_reason,
                usage,
                rounds,
            };

            {
                let mut ctx = MiddlewareCtx {
                    request_id,
                    provider: self.provider.id(),
                    model: &model,
                    messages: self.history.live_mut(),
                    options,
                    state,
                };
                self.middlewares.run_on_response(&mut ctx, &response).await?;
            }

            for observer in &self.observers {
                observer.on_turn_end(request_id, &outcome);
            }

            return Ok(outcome);
        }
    }

    /// Runs one streamed turn. Provider chunks are forwarded raw as
    /// [`TurnEvent::Chunk`] items, then the stream ends with a single
    /// [`TurnEvent::Completed`]. Dropping the stream before completion fires
    /// the call's abort signal.
    pub async fn stream(
        &mut self,
        input: impl Into<MessageContent>,
        options: TurnOptions,
    ) -> Result<TurnStream<'_>, ChatError> {
        let request_id = RequestId::next();
        let mut state = StateMap::new();
        let content = input.into();
        let model = self.resolve_model(&options);

        if let Err(error) = self.preflight(&model, &content, &options, true) {
            self.report_error(request_id, &options, &mut state, &error)
                .await;
            return Err(error);
        }

        if let Err(error) = self.append_message(Message::user(content)) {
            self.report_error(request_id, &options, &mut state, &error)
                .await;
            return Err(error);
        }

        let turn = stream! {
            let abort = options.abort.clone().unwrap_or_default();
            let mut guard = AbortOnDrop::new(abort.clone());
            let max_tool_rounds = options
                .max_tool_rounds
                .unwrap_or(self.policy.max_tool_rounds);
            let mut usage = TokenUsage::default();
            let mut rounds = 0;
            let provider = Arc::clone(&self.provider);

            loop {
                let hook_result = {
                    let mut ctx = MiddlewareCtx {
                        request_id,
                        provider: self.provider.id(),
                        model: &model,
                        messages: self.history.live_mut(),
                        options: &options,
                        state: &mut state,
                    };
                    self.middlewares.run_on_request(&mut ctx).await
                };
                if let Err(error) = hook_result {
                    self.report_error(request_id, &options, &mut state, &error).await;
                    yield Err(error);
                    return;
                }

                let outbound = self
                    .apply_request_transforms(self.history.messages().to_vec())
                    .await;
                let mut request = self.build_request(&model, outbound, &options, true);
                request.abort = Some(abort.clone());

                let policy = self.retry_policy(&options);
                let timeout = options.request_timeout.or(self.policy.request_timeout);
                let opened = {
                    let provider = &provider;
                    execute_with_retry(
                        provider.id(),
                        "stream",
                        &policy,
                        self.operation_hooks.as_ref(),
                        move |_attempt| {
                            let request = request.clone();
                            async move {
                                attempt_with_timeout(provider.stream(request), timeout).await
                            }
                        },
                        |delay| Delay::new(delay),
                    )
                    .await
                };

                let mut provider_stream = match opened {
                    Ok(provider_stream) => provider_stream,
                    Err(error) => {
                        let error = ChatError::from(error);
                        self.report_error(request_id, &options, &mut state, &error).await;
                        yield Err(error);
                        return;
                    }
                };

                let mut accumulator = StreamAccumulator::new();
                let mut failure: Option<ProviderError> = None;
                while let Some(item) = provider_stream.next().await {
                    match item {
                        Ok(chunk) => {
                            accumulator.absorb(&chunk);
                            yield Ok(TurnEvent::Chunk(chunk));
                        }
                        Err(error) => {
                            failure = Some(error);
                            break;
                        }
                    }
                }
                drop(provider_stream);

                if let Some(error) = failure {
                    let error = ChatError::from(error);
                    self.report_error(request_id, &options, &mut state, &error).await;
                    yield Err(error);
                    return;
                }

                if abort.is_aborted() {
                    let error = ChatError::aborted("the call was aborted");
                    self.report_error(request_id, &options, &mut state, &error).await;
                    yield Err(error);
                    return;
                }

                let mut response = accumulator.into_response(self.provider.id(), &model);
                usage.absorb(&response.usage);
                response.content = self.apply_response_transforms(response.content).await;

                let appended = self.append_message(
                    Message::assistant(response.content.clone())
                        .with_tool_calls(response.tool_calls.clone()),
                );
                if let Err(error) = appended {
                    self.report_error(request_id, &options, &mut state, &error).await;
                    yield Err(error);
                    return;
                }

                if !response.tool_calls.is_empty() && options.tool_mode != ToolCallMode::DryRun {
                    rounds += 1;
                    if rounds > max_tool_rounds {
                        let error = ChatError::tool_loop_limit(max_tool_rounds);
                        self.report_error(request_id, &options, &mut state, &error).await;
                        yield Err(error);
                        return;
                    }

                    for call in &response.tool_calls {
                        let executed = {
                            let mut ctx = MiddlewareCtx {
                                request_id,
                                provider: self.provider.id(),
                                model: &model,
                                messages: self.history.live_mut(),
                                options: &options,
                                state: &mut state,
                            };
                            execute_tool_call(
                                &self.tools,
                                self.provider.as_ref(),
                                &self.middlewares,
                                &mut ctx,
                                call,
                            )
                            .await
                        };

                        match executed {
                            Ok(Some(message)) => {
                                if let Err(error) = self.append_message(message) {
                                    self.report_error(request_id, &options, &mut state, &error)
                                        .await;
                                    yield Err(error);
                                    return;
                                }
                            }
                            Ok(None) => {}
                            Err(error) => {
                                self.report_error(request_id, &options, &mut state, &error).await;
                                yield Err(error);
                                return;
                            }
                        }
                    }

                    continue;
                }

                let outcome = TurnOutcome {
                    request_id,
                    content: response.content.clone(),
                    thinking: response.thinking.clone(),
                    tool_calls: if options.tool_mode == ToolCallMode::DryRun {
                        response.tool_calls.clone()
                    } else {
                        Vec::new()
                    },
                    stop_reason: response.stop_reason,
                    usage,
                    rounds,
                };

                let hook_result = {
                    let mut ctx = MiddlewareCtx {
                        request_id,
                        provider: self.provider.id(),
                        model: &model,
                        messages: self.history.live_mut(),
                        options: &options,
                        state: &mut state,
                    };
                    self.middlewares.run_on_response(&mut ctx, &response).await
                };
                if let Err(error) = hook_result {
                    self.report_error(request_id, &options, &mut state, &error).await;
                    yield Err(error);
                    return;
                }

                for observer in &self.observers {
                    observer.on_turn_end(request_id, &outcome);
                }

                guard.disarm();
                yield Ok(TurnEvent::Completed(outcome));
                return;
            }
        };

        Ok(Box::pin(turn))
    }

    fn resolve_model(&self, options: &TurnOptions) -> String {
        options
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model(None))
    }

    fn preflight(
        &self,
        model: &str,
        content: &MessageContent,
        options: &TurnOptions,
        streaming: bool,
    ) -> Result<(), ChatError> {
        if content.is_empty() {
            return Err(ChatError::invalid_request(
                "message content must not be empty",
            ));
        }

        if let Some(abort) = &options.abort
            && abort.is_aborted()
        {
            return Err(ChatError::aborted("the call was aborted before it started"));
        }

        if options.bypass_capability_check {
            return Ok(());
        }

        if !self.tools.is_empty() && !self.provider.supports(model, Capability::Tools) {
            return Err(ChatError::capability(format!(
                "model '{model}' does not support tool calls"
            )));
        }

        if content.has_media() && !self.provider.supports(model, Capability::Vision) {
            return Err(ChatError::capability(format!(
                "model '{model}' does not support media content"
            )));
        }

        if streaming && !self.provider.supports(model, Capability::Streaming) {
            return Err(ChatError::capability(format!(
                "model '{model}' does not support streaming"
            )));
        }

        Ok(())
    }

    fn append_message(&mut self, message: Message) -> Result<(), ChatError> {
        self.history.append(message)?;
        if let Some(appended) = self.history.last() {
            for observer in &self.observers {
                observer.on_new_message(appended);
            }
        }

        Ok(())
    }

    fn build_request(
        &self,
        model: &str,
        messages: Vec<Message>,
        options: &TurnOptions,
        streaming: bool,
    ) -> ChatRequest {
        let mut request = ChatRequest::new(model, messages);
        request.options.temperature = options.temperature;
        request.options.max_tokens = options.max_tokens;
        request.options.stream = streaming;
        request.metadata = options.metadata.clone();
        request.abort = options.abort.clone();
        if !self.tools.is_empty() {
            request.tools = self.tools.definitions();
        }

        request
    }

    fn retry_policy(&self, options: &TurnOptions) -> RetryPolicy {
        match options.max_retries {
            // max_retries counts retries, the policy counts attempts.
            Some(max_retries) => RetryPolicy {
                max_attempts: max_retries.saturating_add(1),
                ..self.policy.retry.clone()
            },
            None => self.policy.retry.clone(),
        }
    }

    async fn call_chat(
        &self,
        request: ChatRequest,
        options: &TurnOptions,
    ) -> Result<ChatResponse, ChatError> {
        let policy = self.retry_policy(options);
        let timeout = options.request_timeout.or(self.policy.request_timeout);
        let provider = &self.provider;

        let response = execute_with_retry(
            provider.id(),
            "chat",
            &policy,
            self.operation_hooks.as_ref(),
            move |_attempt| {
                let request = request.clone();
                async move { attempt_with_timeout(provider.chat(request), timeout).await }
            },
            |delay| Delay::new(delay),
        )
        .await?;

        Ok(response)
    }

    async fn apply_request_transforms(&self, mut messages: Vec<Message>) -> Vec<Message> {
        for transform in &self.request_transforms {
            messages = transform.transform(messages).await;
        }

        messages
    }

    async fn apply_response_transforms(&self, mut content: String) -> String {
        for transform in &self.response_transforms {
            content = transform.transform(content).await;
        }

        content
    }

    /// Single funnel for failed calls so `on_error` fires exactly once per
    /// top-level call.
    async fn report_error(
        &mut self,
        request_id: RequestId,
        options: &TurnOptions,
        state: &mut StateMap,
        error: &ChatError,
    ) {
        let model = self.resolve_model(options);
        let mut ctx = MiddlewareCtx {
            request_id,
            provider: self.provider.id(),
            model: &model,
            messages: self.history.live_mut(),
            options,
            state,
        };

        self.middlewares.run_on_error(&mut ctx, error).await;
    }
}

/// Bounds `future` by `timeout` when one is set. Timed-out attempts surface
/// as [`ProviderError::timeout`] and are never retried.
async fn attempt_with_timeout<T, F>(
    future: F,
    timeout: Option<Duration>,
) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match timeout {
        None => future.await,
        Some(limit) => {
            let future = pin!(future);
            match select(future, Delay::new(limit)).await {
                Either::Left((result, _)) => result,
                Either::Right(_) => Err(ProviderError::timeout(format!(
                    "request exceeded the {limit:?} deadline"
                ))),
            }
        }
    }
}

pub struct ChatEngineBuilder {
    provider: Arc<dyn ChatProvider>,
    seed: Vec<Message>,
    tools: ToolRegistry,
    descriptors: Vec<ToolDescriptor>,
    middlewares: MiddlewarePipeline,
    request_transforms: Vec<Arc<dyn RequestTransform>>,
    response_transforms: Vec<Arc<dyn ResponseTransform>>,
    observers: Vec<Arc<dyn HistoryObserver>>,
    operation_hooks: Arc<dyn ProviderOperationHooks>,
    policy: EnginePolicy,
}

impl ChatEngineBuilder {
    fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            seed: Vec::new(),
            tools: ToolRegistry::new(),
            descriptors: Vec::new(),
            middlewares: MiddlewarePipeline::new(),
            request_transforms: Vec::new(),
            response_transforms: Vec::new(),
            observers: Vec::new(),
            operation_hooks: Arc::new(NoopOperationHooks),
            policy: EnginePolicy::default(),
        }
    }

    /// Seeds the conversation, typically with a system prompt. Seed messages
    /// go through the same append validation as live ones.
    pub fn history(mut self, messages: Vec<Message>) -> Self {
        self.seed = messages;
        self
    }

    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn middleware_arc(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn tool<T>(mut self, tool: T) -> Self
    where
        T: Tool + 'static,
    {
        self.tools.register(tool);
        self
    }

    pub fn tool_default<T>(mut self) -> Self
    where
        T: Tool + Default + 'static,
    {
        self.tools.register_default::<T>();
        self
    }

    pub fn tool_fn<F, Fut>(mut self, definition: pprovider::ToolDefinition, handler: F) -> Self
    where
        F: Fn(String, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.tools.register_fn(definition, handler);
        self
    }

    /// Raw descriptors are normalized at [`ChatEngineBuilder::build`] so a
    /// malformed one fails engine construction, not the first call.
    pub fn tool_descriptor(mut self, descriptor: ToolDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn before_request<F, Fut>(mut self, transform: F) -> Self
    where
        F: Fn(Vec<Message>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<Message>> + Send + 'static,
    {
        self.request_transforms
            .push(Arc::new(FnRequestTransform::new(transform)));
        self
    }

    pub fn after_response<F, Fut>(mut self, transform: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        self.response_transforms
            .push(Arc::new(FnResponseTransform::new(transform)));
        self
    }

    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: HistoryObserver + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn observer_arc(mut self, observer: Arc<dyn HistoryObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn operation_hooks<H>(mut self, hooks: H) -> Self
    where
        H: ProviderOperationHooks + 'static,
    {
        self.operation_hooks = Arc::new(hooks);
        self
    }

    pub fn policy(mut self, policy: EnginePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(mut self) -> Result<ChatEngine, ChatError> {
        self.policy.validate()?;

        for descriptor in self.descriptors {
            self.tools.register_descriptor(descriptor)?;
        }

        let mut history = ConversationState::new();
        for message in self.seed {
            history.append(message)?;
        }

        Ok(ChatEngine {
            provider: self.provider,
            history,
            tools: self.tools,
            middlewares: self.middlewares,
            request_transforms: self.request_transforms,
            response_transforms: self.response_transforms,
            observers: self.observers,
            operation_hooks: self.operation_hooks,
            policy: self.policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatErrorKind;
    use pprovider::{ProviderFuture, ProviderId, StopReason};
    use ptooling::FunctionDecl;

    struct StaticProvider;

    impl ChatProvider for StaticProvider {
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
                Ok(ChatResponse {
                    provider: ProviderId::OpenAi,
                    model: request.model,
                    content: "done".to_string(),
                    thinking: None,
                    tool_calls: Vec::new(),
                    stop_reason: StopReason::EndTurn,
                    usage: TokenUsage::default(),
                })
            })
        }
    }

    #[test]
    fn build_rejects_an_invalid_policy() {
        let error = ChatEngine::builder(StaticProvider)
            .policy(EnginePolicy {
                max_tool_rounds: 0,
                ..EnginePolicy::default()
            })
            .build()
            .expect_err("zero rounds must fail");

        assert_eq!(error.kind, ChatErrorKind::Configuration);
    }

    #[test]
    fn build_rejects_a_malformed_tool_descriptor() {
        let error = ChatEngine::builder(StaticProvider)
            .tool_descriptor(ToolDescriptor::new(FunctionDecl::new("broken", "no callback")))
            .build()
            .expect_err("descriptor without handler must fail");

        assert_eq!(error.kind, ChatErrorKind::Configuration);
        assert!(error.message.contains("broken"));
    }

    #[test]
    fn build_rejects_an_invalid_history_seed() {
        let error = ChatEngine::builder(StaticProvider)
            .history(vec![Message::tool("orphan", "output", false)])
            .build()
            .expect_err("uncorrelated tool seed must fail");

        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn ask_rejects_empty_input_before_touching_the_provider() {
        let mut engine = ChatEngine::builder(StaticProvider)
            .build()
            .expect("engine builds");

        let error = engine
            .ask("", TurnOptions::default())
            .await
            .expect_err("empty input must fail");

        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn per_call_max_retries_overrides_the_engine_policy() {
        let engine = ChatEngine::builder(StaticProvider)
            .build()
            .expect("engine builds");

        let policy = engine.retry_policy(&TurnOptions::new().with_max_retries(0));
        assert_eq!(policy.max_attempts, 1);

        let policy = engine.retry_policy(&TurnOptions::default());
        assert_eq!(policy.max_attempts, 3);
    }

    #[tokio::test]
    async fn attempt_timeout_maps_to_a_timeout_error() {
        let error = attempt_with_timeout::<(), _>(
            async {
                Delay::new(Duration::from_secs(5)).await;
                Ok(())
            },
            Some(Duration::from_millis(5)),
        )
        .await
        .expect_err("slow attempt must time out");

        assert_eq!(error.kind, pprovider::ProviderErrorKind::Timeout);
        assert!(!error.is_retryable());
    }

}
