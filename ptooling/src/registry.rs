//! Insertion-ordered tool registry with lookup by definition name.
//!
//! Every registration form funnels into the same normalized entry, so the
//! engine sees one tool shape regardless of how a tool arrived. Definition
//! order is stable: tools advertise to the provider in the order they were
//! registered, and re-registering a name updates it in place.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use pprovider::ToolDefinition;

use crate::{
    FunctionTool, Tool, ToolDescriptor, ToolError, ToolExecutionContext, normalize_descriptor,
};

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructed tool instance.
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.register_arc(Arc::new(tool));
    }

    /// Registers a tool type by constructing its default instance.
    pub fn register_default<T>(&mut self)
    where
        T: Tool + Default + 'static,
    {
        self.register(T::default());
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        match self.index.get(&name) {
            Some(&position) => self.tools[position] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Registers a raw descriptor, failing fast when it is malformed.
    pub fn register_descriptor(&mut self, descriptor: ToolDescriptor) -> Result<(), ToolError> {
        let tool = normalize_descriptor(descriptor)?;
        self.register(tool);
        Ok(())
    }

    pub fn register_fn<F, Fut>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(String, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(definition, handler));
    }

    pub fn register_sync_fn<F>(&mut self, definition: ToolDefinition, handler: F)
    where
        F: Fn(String, ToolExecutionContext) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.register_fn(definition, move |args_json, context| {
            let output = handler(args_json, context);
            async move { output }
        });
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index
            .get(name)
            .map(|&position| Arc::clone(&self.tools[position]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        let position = self.index.remove(name)?;
        let removed = self.tools.remove(position);

        for shifted in self.index.values_mut() {
            if *shifted > position {
                *shifted -= 1;
            }
        }

        Some(removed)
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FunctionDecl, tool_handler};
    use pcommon::RequestId;

    #[derive(Default)]
    struct ClockTool;

    impl Tool for ClockTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("clock", "Reports a fixed time")
        }

        fn invoke<'a>(
            &'a self,
            _args_json: &'a str,
            _context: &'a ToolExecutionContext,
        ) -> crate::ToolFuture<'a, Result<String, ToolError>> {
            Box::pin(async move { Ok("12:00".to_string()) })
        }
    }

    fn echo_descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(FunctionDecl::new(name, "Echoes input"))
            .with_handler(tool_handler(|args, _ctx| async move { Ok(args) }))
    }

    #[tokio::test]
    async fn all_registration_forms_produce_equivalent_entries() {
        let mut registry = ToolRegistry::new();

        registry.register_default::<ClockTool>();
        registry.register(FunctionTool::new(
            ToolDefinition::new("echo", "Echoes input"),
            |args, _ctx| async move { Ok(args) },
        ));
        registry
            .register_descriptor(echo_descriptor("lookup"))
            .expect("descriptor should register");

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect();
        assert_eq!(names, vec!["clock", "echo", "lookup"]);

        let context = ToolExecutionContext::new(RequestId::next());
        for name in ["echo", "lookup"] {
            let tool = registry.get(name).expect("tool should exist");
            let output = tool
                .invoke("payload", &context)
                .await
                .expect("invocation should succeed");
            assert_eq!(output, "payload");
        }
    }

    #[test]
    fn definitions_keep_insertion_order_across_re_registration() {
        let mut registry = ToolRegistry::new();
        registry
            .register_descriptor(echo_descriptor("alpha"))
            .expect("alpha should register");
        registry
            .register_descriptor(echo_descriptor("beta"))
            .expect("beta should register");

        // Updating alpha must not move it behind beta.
        registry
            .register_descriptor(echo_descriptor("alpha"))
            .expect("alpha update should register");
        registry
            .register_descriptor(echo_descriptor("gamma"))
            .expect("gamma should register");

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn remove_reindexes_remaining_tools() {
        let mut registry = ToolRegistry::new();
        registry
            .register_descriptor(echo_descriptor("alpha"))
            .expect("alpha should register");
        registry
            .register_descriptor(echo_descriptor("beta"))
            .expect("beta should register");
        registry
            .register_descriptor(echo_descriptor("gamma"))
            .expect("gamma should register");

        assert!(registry.remove("beta").is_some());
        assert!(!registry.contains("beta"));
        assert_eq!(registry.len(), 2);
        assert!(registry.get("gamma").is_some());

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect();
        assert_eq!(names, vec!["alpha", "gamma"]);
    }

    #[test]
    fn malformed_descriptor_is_rejected_and_not_registered() {
        let mut registry = ToolRegistry::new();
        let result = registry.register_descriptor(ToolDescriptor::new(FunctionDecl::new(
            "broken",
            "No callback",
        )));

        assert!(result.is_err());
        assert!(registry.is_empty());
    }
}
