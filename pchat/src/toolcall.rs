//! Per-call tool execution: gating, hook wrapping, and error policy.

use pprovider::{ChatProvider, Message, ToolCall};
use ptooling::{ToolError, ToolExecutionContext, ToolRegistry};

use crate::{ChatError, MiddlewareCtx, MiddlewarePipeline, ToolCallMode, ToolErrorDirective};

/// Fixed notice folded into the conversation when a confirm gate declines a
/// call, so the model knows the result is absent on purpose.
pub const TOOL_CALL_DECLINED_NOTICE: &str = "Tool call was not executed: declined by the user.";

/// Runs one requested tool call and decides what enters the conversation.
///
/// Returns `Ok(Some(message))` with the tool message to append, or `Err` when
/// the failure must end the whole turn. Dry-run calls never reach this
/// function.
pub(crate) async fn execute_tool_call(
    tools: &ToolRegistry,
    provider: &dyn ChatProvider,
    middlewares: &MiddlewarePipeline,
    ctx: &mut MiddlewareCtx<'_>,
    call: &ToolCall,
) -> Result<Option<Message>, ChatError> {
    if ctx.options.tool_mode == ToolCallMode::Confirm {
        let approved = match &ctx.options.confirm {
            Some(gate) => gate.confirm(call).await,
            None => false,
        };

        if !approved {
            return Ok(Some(provider.format_tool_result(
                call,
                TOOL_CALL_DECLINED_NOTICE,
                false,
            )));
        }
    }

    middlewares.run_on_tool_call_start(ctx, call).await?;

    match invoke_tool(tools, ctx, call).await {
        Ok(output) => {
            middlewares.run_on_tool_call_end(ctx, call, &output).await?;
            Ok(Some(provider.format_tool_result(call, &output, false)))
        }
        Err(error) => {
            let directive = middlewares.run_on_tool_call_error(ctx, call, &error).await;

            let (directive, error) = match directive {
                Some(ToolErrorDirective::Retry) => match invoke_tool(tools, ctx, call).await {
                    Ok(output) => {
                        middlewares.run_on_tool_call_end(ctx, call, &output).await?;
                        return Ok(Some(provider.format_tool_result(call, &output, false)));
                    }
                    // The second failure gets the default policy; the hook is
                    // not consulted again for this call.
                    Err(second) => (None, second),
                },
                other => (other, error),
            };

            let stop = match directive {
                Some(ToolErrorDirective::Stop) => true,
                Some(ToolErrorDirective::Continue) => false,
                Some(ToolErrorDirective::Retry) | None => error.is_fatal(),
            };

            if stop {
                Err(ChatError::from_tool(error))
            } else {
                Ok(Some(provider.format_tool_result(call, &error.message, true)))
            }
        }
    }
}

async fn invoke_tool(
    tools: &ToolRegistry,
    ctx: &MiddlewareCtx<'_>,
    call: &ToolCall,
) -> Result<String, ToolError> {
    let Some(tool) = tools.get(&call.name) else {
        return Err(
            ToolError::not_found(format!("tool '{}' is not registered", call.name))
                .with_tool_name(call.name.as_str())
                .with_tool_call_id(call.id.as_str()),
        );
    };

    let mut context = ToolExecutionContext::new(ctx.request_id);
    context.metadata = ctx.options.metadata.clone();

    tool.invoke(&call.arguments, &context)
        .await
        .map_err(|mut error| {
            if error.tool_name.is_none() {
                error.tool_name = Some(call.name.clone());
            }

            if error.tool_call_id.is_none() {
                error.tool_call_id = Some(call.id.clone());
            }

            error
        })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{ChatErrorKind, Middleware, StateMap, TurnOptions};
    use pcommon::{BoxFuture, RequestId};
    use pprovider::{
        Capability, ChatRequest, ChatResponse, ProviderError, ProviderFuture, ProviderId,
        ToolDefinition,
    };
    use ptooling::ToolErrorKind;

    struct StubProvider;

    impl ChatProvider for StubProvider {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAi
        }

        fn default_model(&self, _capability: Option<Capability>) -> String {
            "gpt-4o-mini".to_string()
        }

        fn chat<'a>(
            &'a self,
            _request: ChatRequest,
        ) -> ProviderFuture<'a, Result<ChatResponse, ProviderError>> {
            Box::pin(async move { Err(ProviderError::unavailable("not under test")) })
        }
    }

    struct DirectiveMiddleware {
        directive: Option<ToolErrorDirective>,
        consulted: AtomicU32,
    }

    impl Middleware for DirectiveMiddleware {
        fn name(&self) -> &str {
            "directive"
        }

        fn on_tool_call_error<'a>(
            &'a self,
            _ctx: &'a mut MiddlewareCtx<'_>,
            _call: &'a ToolCall,
            _error: &'a ToolError,
        ) -> BoxFuture<'a, Option<ToolErrorDirective>> {
            Box::pin(async move {
                self.consulted.fetch_add(1, Ordering::SeqCst);
                self.directive
            })
        }
    }

    struct Fixture {
        options: TurnOptions,
        messages: Vec<Message>,
        state: StateMap,
    }

    impl Fixture {
        fn new(options: TurnOptions) -> Self {
            Self {
                options,
                messages: Vec::new(),
                state: StateMap::new(),
            }
        }

        fn ctx(&mut self) -> MiddlewareCtx<'_> {
            MiddlewareCtx {
                request_id: RequestId::next(),
                provider: ProviderId::OpenAi,
                model: "gpt-4o-mini",
                messages: &mut self.messages,
                options: &self.options,
                state: &mut self.state,
            }
        }
    }

    fn failing_registry(error: ToolError, failures_before_success: u32) -> (ToolRegistry, Arc<AtomicU32>) {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut registry = ToolRegistry::new();
        let counter = Arc::clone(&attempts);
        registry.register_sync_fn(
            ToolDefinition::new("flaky", "Fails on demand"),
            move |_args, _ctx| {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt <= failures_before_success {
                    Err(error.clone())
                } else {
                    Ok("recovered".to_string())
                }
            },
        );

        (registry, attempts)
    }

    #[tokio::test]
    async fn fatal_error_without_directive_ends_the_turn() {
        let (registry, _) = failing_registry(ToolError::execution("API Key Expired").fatal(), u32::MAX);
        let pipeline = MiddlewarePipeline::new();
        let mut fixture = Fixture::new(TurnOptions::default());
        let mut ctx = fixture.ctx();

        let call = ToolCall::new("call_1", "flaky", "{}");
        let error = execute_tool_call(&registry, &StubProvider, &pipeline, &mut ctx, &call)
            .await
            .expect_err("fatal error must end the turn");

        assert_eq!(error.kind, ChatErrorKind::Tool);
        assert_eq!(error.message, "API Key Expired");
    }

    #[tokio::test]
    async fn non_fatal_error_becomes_an_error_tool_message() {
        let (registry, _) = failing_registry(ToolError::execution("disk full"), u32::MAX);
        let pipeline = MiddlewarePipeline::new();
        let mut fixture = Fixture::new(TurnOptions::default());
        let mut ctx = fixture.ctx();

        let call = ToolCall::new("call_1", "flaky", "{}");
        let message = execute_tool_call(&registry, &StubProvider, &pipeline, &mut ctx, &call)
            .await
            .expect("non-fatal error is swallowed")
            .expect("a tool message is produced");

        assert!(message.is_error);
        assert_eq!(message.text(), "disk full");
        assert_eq!(message.tool_call_id.as_deref(), Some("call_1"));
    }

    #[tokio::test]
    async fn continue_directive_overrides_a_fatal_error() {
        let (registry, _) = failing_registry(ToolError::unauthorized("no grant"), u32::MAX);
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.push(Arc::new(DirectiveMiddleware {
            directive: Some(ToolErrorDirective::Continue),
            consulted: AtomicU32::new(0),
        }));
        let mut fixture = Fixture::new(TurnOptions::default());
        let mut ctx = fixture.ctx();

        let call = ToolCall::new("call_1", "flaky", "{}");
        let message = execute_tool_call(&registry, &StubProvider, &pipeline, &mut ctx, &call)
            .await
            .expect("continue overrides fatality")
            .expect("a tool message is produced");

        assert!(message.is_error);
    }

    #[tokio::test]
    async fn stop_directive_overrides_a_non_fatal_error() {
        let (registry, _) = failing_registry(ToolError::execution("flaky network"), u32::MAX);
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.push(Arc::new(DirectiveMiddleware {
            directive: Some(ToolErrorDirective::Stop),
            consulted: AtomicU32::new(0),
        }));
        let mut fixture = Fixture::new(TurnOptions::default());
        let mut ctx = fixture.ctx();

        let call = ToolCall::new("call_1", "flaky", "{}");
        let error = execute_tool_call(&registry, &StubProvider, &pipeline, &mut ctx, &call)
            .await
            .expect_err("stop ends the turn");

        assert_eq!(error.kind, ChatErrorKind::Tool);
        assert_eq!(error.message, "flaky network");
    }

    #[tokio::test]
    async fn retry_directive_reruns_the_handler_exactly_once() {
        let (registry, attempts) = failing_registry(ToolError::execution("transient"), 1);
        let hook = Arc::new(DirectiveMiddleware {
            directive: Some(ToolErrorDirective::Retry),
            consulted: AtomicU32::new(0),
        });
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.push(Arc::clone(&hook) as Arc<dyn Middleware>);
        let mut fixture = Fixture::new(TurnOptions::default());
        let mut ctx = fixture.ctx();

        let call = ToolCall::new("call_1", "flaky", "{}");
        let message = execute_tool_call(&registry, &StubProvider, &pipeline, &mut ctx, &call)
            .await
            .expect("retry recovers")
            .expect("a tool message is produced");

        assert!(!message.is_error);
        assert_eq!(message.text(), "recovered");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(hook.consulted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_directive_second_failure_uses_default_policy() {
        let (registry, attempts) = failing_registry(ToolError::execution("still broken"), u32::MAX);
        let hook = Arc::new(DirectiveMiddleware {
            directive: Some(ToolErrorDirective::Retry),
            consulted: AtomicU32::new(0),
        });
        let mut pipeline = MiddlewarePipeline::new();
        pipeline.push(Arc::clone(&hook) as Arc<dyn Middleware>);
        let mut fixture = Fixture::new(TurnOptions::default());
        let mut ctx = fixture.ctx();

        let call = ToolCall::new("call_1", "flaky", "{}");
        let message = execute_tool_call(&registry, &StubProvider, &pipeline, &mut ctx, &call)
            .await
            .expect("non-fatal second failure is swallowed")
            .expect("a tool message is produced");

        assert!(message.is_error);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert_eq!(hook.consulted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn declined_confirm_synthesizes_the_notice_without_executing() {
        let (registry, attempts) = failing_registry(ToolError::execution("unused"), 0);
        let pipeline = MiddlewarePipeline::new();
        let declined = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&declined);
        let options = TurnOptions::new().confirm_with(move |call: &ToolCall| {
            log.lock().expect("log lock").push(call.name.clone());
            false
        });
        let mut fixture = Fixture::new(options);
        let mut ctx = fixture.ctx();

        let call = ToolCall::new("call_1", "flaky", "{}");
        let message = execute_tool_call(&registry, &StubProvider, &pipeline, &mut ctx, &call)
            .await
            .expect("declined call is not an error")
            .expect("a notice message is produced");

        assert_eq!(message.text(), TOOL_CALL_DECLINED_NOTICE);
        assert!(!message.is_error);
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
        assert_eq!(declined.lock().expect("log lock").clone(), vec!["flaky"]);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_a_not_found_error_message() {
        let registry = ToolRegistry::new();
        let pipeline = MiddlewarePipeline::new();
        let mut fixture = Fixture::new(TurnOptions::default());
        let mut ctx = fixture.ctx();

        let call = ToolCall::new("call_1", "ghost", "{}");
        let message = execute_tool_call(&registry, &StubProvider, &pipeline, &mut ctx, &call)
            .await
            .expect("missing tool is non-fatal")
            .expect("a tool message is produced");

        assert!(message.is_error);
        assert!(message.text().contains("ghost"));
    }

    #[test]
    fn not_found_errors_are_classified_for_callers() {
        let error = ToolError::not_found("nope");
        assert_eq!(error.kind, ToolErrorKind::NotFound);
        assert!(!error.is_fatal());
    }
}
