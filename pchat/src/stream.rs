//! Chunk accumulation and abort plumbing for streamed turns.

use std::collections::BTreeMap;

use pprovider::{
    AbortSignal, ChatResponse, ProviderId, StopReason, StreamChunk, TokenUsage, ToolCall,
};

/// Partially assembled tool call, keyed by the provider's chunk index.
#[derive(Debug, Default)]
struct ToolCallFragment {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Folds a chunk sequence back into the same [`ChatResponse`] a buffered call
/// would have produced, so the tool loop is identical on both paths.
#[derive(Debug, Default)]
pub(crate) struct StreamAccumulator {
    text: String,
    thinking: String,
    fragments: BTreeMap<u32, ToolCallFragment>,
    usage: TokenUsage,
    stop_reason: Option<StopReason>,
}

impl StreamAccumulator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn absorb(&mut self, chunk: &StreamChunk) {
        match chunk {
            StreamChunk::TextDelta(delta) => self.text.push_str(delta),
            StreamChunk::ThinkingDelta(delta) => self.thinking.push_str(delta),
            StreamChunk::ToolCallDelta(delta) => {
                let fragment = self.fragments.entry(delta.index).or_default();
                if let Some(id) = &delta.id {
                    fragment.id = Some(id.clone());
                }
                if let Some(name) = &delta.name {
                    fragment.name = Some(name.clone());
                }
                fragment.arguments.push_str(&delta.arguments_fragment);
            }
            StreamChunk::Usage(usage) => self.usage.absorb(usage),
            StreamChunk::Completed { stop_reason } => self.stop_reason = Some(*stop_reason),
        }
    }

    pub(crate) fn into_response(self, provider: ProviderId, model: &str) -> ChatResponse {
        let tool_calls = self
            .fragments
            .into_iter()
            .map(|(index, fragment)| ToolCall {
                id: fragment.id.unwrap_or_else(|| format!("call_{index}")),
                name: fragment.name.unwrap_or_default(),
                arguments: fragment.arguments,
            })
            .collect();

        ChatResponse {
            provider,
            model: model.to_string(),
            content: self.text,
            thinking: if self.thinking.is_empty() {
                None
            } else {
                Some(self.thinking)
            },
            tool_calls,
            stop_reason: self.stop_reason.unwrap_or(StopReason::Other),
            usage: self.usage,
        }
    }
}

/// Fires the abort signal if the consumer drops the turn stream before it
/// finishes, so an in-flight provider request is told to stop.
pub(crate) struct AbortOnDrop {
    signal: AbortSignal,
    armed: bool,
}

impl AbortOnDrop {
    pub(crate) fn new(signal: AbortSignal) -> Self {
        Self {
            signal,
            armed: true,
        }
    }

    /// Called on natural completion; the signal is left untouched.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.signal.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pprovider::ToolCallDelta;

    #[test]
    fn accumulator_reassembles_interleaved_deltas() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.absorb(&StreamChunk::ThinkingDelta("planning".to_string()));
        accumulator.absorb(&StreamChunk::TextDelta("Hello".to_string()));
        accumulator.absorb(&StreamChunk::ToolCallDelta(ToolCallDelta {
            index: 0,
            id: Some("call_a".to_string()),
            name: Some("lookup".to_string()),
            arguments_fragment: "{\"city\":".to_string(),
        }));
        accumulator.absorb(&StreamChunk::TextDelta(", world".to_string()));
        accumulator.absorb(&StreamChunk::ToolCallDelta(ToolCallDelta {
            index: 0,
            id: None,
            name: None,
            arguments_fragment: "\"Oslo\"}".to_string(),
        }));
        accumulator.absorb(&StreamChunk::Usage(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
            ..TokenUsage::default()
        }));
        accumulator.absorb(&StreamChunk::Completed {
            stop_reason: StopReason::ToolUse,
        });

        let response = accumulator.into_response(ProviderId::Anthropic, "claude-sonnet-4-5");
        assert_eq!(response.content, "Hello, world");
        assert_eq!(response.thinking.as_deref(), Some("planning"));
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.usage.total_tokens, 15);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_a");
        assert_eq!(response.tool_calls[0].name, "lookup");
        assert_eq!(response.tool_calls[0].arguments, "{\"city\":\"Oslo\"}");
    }

    #[test]
    fn missing_tool_call_ids_fall_back_to_the_index() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.absorb(&StreamChunk::ToolCallDelta(ToolCallDelta {
            index: 3,
            id: None,
            name: Some("echo".to_string()),
            arguments_fragment: "{}".to_string(),
        }));

        let response = accumulator.into_response(ProviderId::OpenAi, "gpt-4o-mini");
        assert_eq!(response.tool_calls[0].id, "call_3");
        assert_eq!(response.stop_reason, StopReason::Other);
    }

    #[test]
    fn guard_aborts_on_drop_unless_disarmed() {
        let signal = AbortSignal::new();
        {
            let _guard = AbortOnDrop::new(signal.clone());
        }
        assert!(signal.is_aborted());

        let signal = AbortSignal::new();
        {
            let mut guard = AbortOnDrop::new(signal.clone());
            guard.disarm();
        }
        assert!(!signal.is_aborted());
    }
}
