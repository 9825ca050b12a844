//! Engine-level errors and classification.
//!
//! Lower-layer errors are carried, not re-wrapped: the original
//! [`ProviderError`] or [`ToolError`] rides along in [`ChatErrorSource`] with
//! its message passed through verbatim, so callers can branch on the exact
//! failure that occurred.

use std::error::Error;
use std::fmt::{Display, Formatter};

use pprovider::{ProviderError, ProviderErrorKind};
use ptooling::{ToolError, ToolErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    Configuration,
    Capability,
    Provider,
    Tool,
    ToolLoopLimit,
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatErrorSource {
    Provider(ProviderError),
    Tool(ToolError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub source: Option<ChatErrorSource>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Configuration, message)
    }

    pub fn capability(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Capability, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Aborted, message)
    }

    pub fn tool_loop_limit(max_tool_rounds: u32) -> Self {
        Self::new(
            ChatErrorKind::ToolLoopLimit,
            format!("tool loop exceeded the limit of {max_tool_rounds} round(s)"),
        )
    }

    pub fn from_provider(error: ProviderError) -> Self {
        let kind = match error.kind {
            ProviderErrorKind::Configuration | ProviderErrorKind::NotConfigured => {
                ChatErrorKind::Configuration
            }
            ProviderErrorKind::Capability | ProviderErrorKind::NotFound => ChatErrorKind::Capability,
            ProviderErrorKind::BadRequest => ChatErrorKind::InvalidRequest,
            _ => ChatErrorKind::Provider,
        };

        Self {
            kind,
            message: error.message.clone(),
            source: Some(ChatErrorSource::Provider(error)),
        }
    }

    pub fn from_tool(error: ToolError) -> Self {
        let kind = if error.kind == ToolErrorKind::Configuration {
            ChatErrorKind::Configuration
        } else {
            ChatErrorKind::Tool
        };

        Self {
            kind,
            message: error.message.clone(),
            source: Some(ChatErrorSource::Tool(error)),
        }
    }

    pub fn provider_source(&self) -> Option<&ProviderError> {
        match &self.source {
            Some(ChatErrorSource::Provider(error)) => Some(error),
            _ => None,
        }
    }

    pub fn tool_source(&self) -> Option<&ToolError> {
        match &self.source {
            Some(ChatErrorSource::Tool(error)) => Some(error),
            _ => None,
        }
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(ChatErrorSource::Provider(error)) => Some(error),
            Some(ChatErrorSource::Tool(error)) => Some(error),
            None => None,
        }
    }
}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        ChatError::from_provider(value)
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        ChatError::from_tool(value)
    }
}
