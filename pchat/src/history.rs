//! Append-only conversation state and persistence observer surface.

use pcommon::RequestId;
use pprovider::{Message, Role};

use crate::{ChatError, TurnOutcome};

/// The live message history of one conversation.
///
/// Appends are validated: a tool message must correlate to a tool call id
/// issued by an earlier assistant message, so the transcript can always be
/// replayed against a provider without rejection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) -> Result<(), ChatError> {
        if message.role == Role::Tool {
            let Some(tool_call_id) = message.tool_call_id.as_deref() else {
                return Err(ChatError::invalid_request(
                    "tool message is missing tool_call_id",
                ));
            };

            if !self.has_tool_call(tool_call_id) {
                return Err(ChatError::invalid_request(format!(
                    "tool message references unknown tool call '{tool_call_id}'"
                )));
            }
        }

        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Mutable access for middleware hooks; the engine hands this out
    /// per call through the middleware context.
    pub(crate) fn live_mut(&mut self) -> &mut Vec<Message> {
        &mut self.messages
    }

    fn has_tool_call(&self, tool_call_id: &str) -> bool {
        self.messages
            .iter()
            .filter(|message| message.role == Role::Assistant)
            .flat_map(|message| message.tool_calls.iter())
            .any(|call| call.id == tool_call_id)
    }
}

/// Fire-and-forget notifications about history growth and finished turns.
/// This is the attachment point for durable persistence; the engine itself
/// keeps history in memory only.
pub trait HistoryObserver: Send + Sync {
    fn on_new_message(&self, _message: &Message) {}

    fn on_turn_end(&self, _request_id: RequestId, _outcome: &TurnOutcome) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatErrorKind;
    use pprovider::ToolCall;

    #[test]
    fn append_accepts_correlated_tool_messages() {
        let mut state = ConversationState::new();
        state.append(Message::user("hi")).expect("user appends");
        state
            .append(
                Message::assistant("calling a tool")
                    .with_tool_calls(vec![ToolCall::new("call_1", "echo", "{}")]),
            )
            .expect("assistant appends");

        state
            .append(Message::tool("call_1", "echoed", false))
            .expect("correlated tool message appends");
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn append_rejects_uncorrelated_tool_messages() {
        let mut state = ConversationState::new();
        state.append(Message::user("hi")).expect("user appends");

        let error = state
            .append(Message::tool("call_missing", "output", false))
            .expect_err("uncorrelated tool message must fail");
        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn append_rejects_tool_messages_without_an_id() {
        let mut state = ConversationState::new();
        let mut message = Message::tool("x", "output", false);
        message.tool_call_id = None;

        let error = state
            .append(message)
            .expect_err("tool message without id must fail");
        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
    }
}
