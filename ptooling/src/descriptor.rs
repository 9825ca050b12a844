//! Raw tool descriptors and their normalization into invocable tools.
//!
//! Descriptors are the loose, data-shaped way callers hand over tools:
//! a function declaration plus a handler closure. Normalization resolves a
//! descriptor into the same [`FunctionTool`] shape trait-based tools use, and
//! rejects malformed descriptors with a configuration error up front instead
//! of failing later at call time.
//!
//! ```rust
//! use ptooling::{FunctionDecl, ToolDescriptor, normalize_descriptor, tool_handler};
//!
//! let descriptor = ToolDescriptor {
//!     function: FunctionDecl::new("echo", "Echoes input"),
//!     handler: Some(tool_handler(|args, _ctx| async move { Ok(args) })),
//!     execute: None,
//! };
//!
//! let tool = normalize_descriptor(descriptor).expect("descriptor should normalize");
//! ```

use serde_json::Value;

use crate::tool::ToolHandler;
use crate::{FunctionTool, ToolError};
use pprovider::ToolDefinition;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub description: String,
    pub parameters: Option<Value>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// A data-shaped tool registration. `handler` is the supported callback slot;
/// `execute` exists only so the common mistake of filling it instead of
/// `handler` can be diagnosed with a precise message.
pub struct ToolDescriptor {
    pub function: FunctionDecl,
    pub handler: Option<Arc<ToolHandler>>,
    pub execute: Option<Arc<ToolHandler>>,
}

impl ToolDescriptor {
    pub fn new(function: FunctionDecl) -> Self {
        Self {
            function,
            handler: None,
            execute: None,
        }
    }

    pub fn with_handler(mut self, handler: Arc<ToolHandler>) -> Self {
        self.handler = Some(handler);
        self
    }
}

/// Resolves a descriptor into an invocable [`FunctionTool`].
///
/// Malformed descriptors fail here, once, at registration time. The
/// `execute`-instead-of-`handler` mistake gets its own message so the fix is
/// obvious from the error alone.
pub fn normalize_descriptor(descriptor: ToolDescriptor) -> Result<FunctionTool, ToolError> {
    let name = descriptor.function.name.trim();
    if name.is_empty() {
        return Err(ToolError::configuration(
            "tool descriptor is missing a function name",
        ));
    }

    let handler = match (descriptor.handler, descriptor.execute) {
        (Some(handler), _) => handler,
        (None, Some(_)) => {
            return Err(ToolError::configuration(format!(
                "tool '{name}' was given 'execute' instead of 'handler'; raw descriptors \
                 take a 'handler' callback ('execute' belongs to Tool implementations)"
            ))
            .with_tool_name(name));
        }
        (None, None) => {
            return Err(
                ToolError::configuration(format!("tool '{name}' has no handler"))
                    .with_tool_name(name),
            );
        }
    };

    let definition = ToolDefinition {
        name: name.to_string(),
        description: descriptor.function.description,
        parameters: descriptor
            .function
            .parameters
            .unwrap_or_else(|| serde_json::json!({ "type": "object" })),
    };

    Ok(FunctionTool::from_handler(definition, handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tool, ToolErrorKind, ToolExecutionContext, tool_handler};
    use pcommon::RequestId;

    fn echo_handler() -> Arc<ToolHandler> {
        tool_handler(|args, _ctx| async move { Ok(args) })
    }

    #[tokio::test]
    async fn well_formed_descriptor_normalizes_to_an_invocable_tool() {
        let descriptor = ToolDescriptor::new(
            FunctionDecl::new("echo", "Echoes input")
                .with_parameters(serde_json::json!({ "type": "object" })),
        )
        .with_handler(echo_handler());

        let tool = normalize_descriptor(descriptor).expect("descriptor should normalize");
        assert_eq!(tool.definition().name, "echo");

        let context = ToolExecutionContext::new(RequestId::next());
        let output = tool
            .invoke("{\"text\":\"hi\"}", &context)
            .await
            .expect("invocation should succeed");
        assert_eq!(output, "{\"text\":\"hi\"}");
    }

    #[test]
    fn missing_name_fails_with_configuration_error() {
        let descriptor =
            ToolDescriptor::new(FunctionDecl::new("  ", "anonymous")).with_handler(echo_handler());

        let error = normalize_descriptor(descriptor).expect_err("missing name must fail");
        assert_eq!(error.kind, ToolErrorKind::Configuration);
        assert!(error.message.contains("missing a function name"));
    }

    #[test]
    fn execute_instead_of_handler_gets_a_distinguishing_message() {
        let descriptor = ToolDescriptor {
            function: FunctionDecl::new("lookup", "Looks things up"),
            handler: None,
            execute: Some(echo_handler()),
        };

        let error = normalize_descriptor(descriptor).expect_err("misplaced callback must fail");
        assert_eq!(error.kind, ToolErrorKind::Configuration);
        assert!(error.message.contains("'execute' instead of 'handler'"));

        let missing = ToolDescriptor::new(FunctionDecl::new("lookup", "Looks things up"));
        let error = normalize_descriptor(missing).expect_err("missing callback must fail");
        assert!(error.message.contains("has no handler"));
        assert!(!error.message.contains("'execute'"));
    }
}
