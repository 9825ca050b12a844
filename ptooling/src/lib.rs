//! Capability layer for registering and normalizing tools.

mod args;
mod descriptor;
mod error;
mod registry;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        FunctionDecl, FunctionTool, Tool, ToolArgs, ToolDescriptor, ToolError, ToolErrorKind,
        ToolExecutionContext, ToolFuture, ToolRegistry, tool_handler,
    };
}

pub use args::ToolArgs;
pub use descriptor::{FunctionDecl, ToolDescriptor, normalize_descriptor};
pub use error::{ToolError, ToolErrorKind};
pub use registry::ToolRegistry;
pub use tool::{FunctionTool, Tool, ToolFuture, ToolHandler, tool_handler};
pub use types::ToolExecutionContext;
