use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use producer_model::ModelTool;
use serde_json::Value;

use crate::host::HostAdapter;
use crate::tool::{AnyTool, Error, FnTool, Tool, ToolObject, ToolResult};

/// A name-keyed catalog of tools.
///
/// Tools are described to the model in registration order, and
/// dispatched by name. A failing or panicking tool never escapes as
/// anything but an error result.
#[derive(Default)]
pub struct Registry {
    tools: Vec<Box<dyn ToolObject>>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a typed tool.
    ///
    /// # Panics
    ///
    /// Panics if a tool with the same name is already registered.
    pub fn register<T: Tool>(&mut self, tool: T) {
        self.insert(Box::new(AnyTool(tool)));
    }

    /// Registers a tool from its parts. The handler gets the raw argument
    /// object.
    ///
    /// # Panics
    ///
    /// Panics if a tool with the same name is already registered.
    pub fn register_fn<F>(
        &mut self,
        name: &str,
        description: &str,
        parameter_schema: Value,
        handler: F,
    ) where
        F: Fn(&mut dyn HostAdapter, Value) -> ToolResult
            + Send
            + Sync
            + 'static,
    {
        self.insert(Box::new(FnTool {
            name: name.to_owned(),
            description: description.to_owned(),
            parameter_schema,
            handler: Box::new(handler),
        }));
    }

    fn insert(&mut self, tool: Box<dyn ToolObject>) {
        let name = tool.name().to_owned();
        assert!(
            !self.by_name.contains_key(&name),
            "tool `{name}` is registered twice"
        );
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether no tools are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns whether a tool with this name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Describes every tool for inclusion in a model request.
    pub fn describe_all(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Runs the named tool against the host.
    pub fn execute(
        &self,
        name: &str,
        arguments: Value,
        host: &mut dyn HostAdapter,
    ) -> ToolResult {
        let span = debug_span!("tool registry", tool = name);
        let _enter = span.enter();

        let Some(&idx) = self.by_name.get(name) else {
            warn!("tool not found: {name}");
            return Err(Error::unknown_tool(name));
        };
        trace!("executing with args: {arguments}");

        let tool = &self.tools[idx];
        let result =
            catch_unwind(AssertUnwindSafe(|| tool.execute(host, arguments)))
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    error!("tool panicked: {message}");
                    Err(Error::execution_error().with_reason(format!(
                        "Tool execution error: {message}"
                    )))
                });
        if let Err(err) = &result {
            debug!("tool failed: {err}");
        }
        result
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
