//! Small convenience constructors for common types.

use std::sync::Arc;

use crate::{ChatEngineBuilder, ChatProvider, Message, ProviderId};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::system(content.into())
}

pub fn developer_message(content: impl Into<String>) -> Message {
    Message::developer(content.into())
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::user(content.into())
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::assistant(content.into())
}

pub fn tool_message(
    tool_call_id: impl Into<String>,
    output: impl Into<String>,
    is_error: bool,
) -> Message {
    Message::tool(tool_call_id, output.into(), is_error)
}

/// Shorthand for [`crate::ChatEngine::builder`].
pub fn engine<P>(provider: P) -> ChatEngineBuilder
where
    P: ChatProvider + 'static,
{
    crate::ChatEngine::builder(provider)
}

/// Shorthand for [`crate::ChatEngine::builder_arc`].
pub fn engine_arc(provider: Arc<dyn ChatProvider>) -> ChatEngineBuilder {
    crate::ChatEngine::builder_arc(provider)
}

pub fn parse_provider_id(value: &str) -> Option<ProviderId> {
    match value.trim().to_ascii_lowercase().as_str() {
        "openai" => Some(ProviderId::OpenAi),
        "claude" | "anthropic" => Some(ProviderId::Anthropic),
        "google" | "gemini" => Some(ProviderId::Gemini),
        "deepseek" => Some(ProviderId::DeepSeek),
        "aws" | "bedrock" => Some(ProviderId::Bedrock),
        "local" | "ollama" => Some(ProviderId::Ollama),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::{ProviderId, Role};

    use super::{parse_provider_id, tool_message, user_message};

    #[test]
    fn parse_provider_id_supports_aliases() {
        assert_eq!(parse_provider_id("openai"), Some(ProviderId::OpenAi));
        assert_eq!(parse_provider_id("Claude"), Some(ProviderId::Anthropic));
        assert_eq!(parse_provider_id("gemini"), Some(ProviderId::Gemini));
        assert_eq!(parse_provider_id("local"), Some(ProviderId::Ollama));
        assert_eq!(parse_provider_id("unknown"), None);
    }

    #[test]
    fn message_helpers_apply_expected_defaults() {
        let message = user_message("hello");
        assert_eq!(message.role, Role::User);

        let result = tool_message("call-1", "3 results", false);
        assert_eq!(result.role, Role::Tool);
        assert_eq!(result.tool_call_id.as_deref(), Some("call-1"));
        assert!(!result.is_error);
    }
}
