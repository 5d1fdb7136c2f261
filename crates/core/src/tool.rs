//! Tool call supports.

mod error;
mod registry;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub use registry::Registry;

use crate::host::HostAdapter;

/// The result of a tool call: a compact JSON payload on success.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless. Everything a tool
/// reads or changes lives behind the [`HostAdapter`] it is handed.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool, a JSON schema whose root
    /// has `"type": "object"`.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// Tools run synchronously between two conversation events, so they
    /// must be cheap.
    fn execute(
        &self,
        host: &mut dyn HostAdapter,
        input: Self::Input,
    ) -> ToolResult;
}

/// Serializes a tool payload as compact JSON.
pub fn to_payload<T: Serialize + ?Sized>(payload: &T) -> ToolResult {
    serde_json::to_string(payload).map_err(|err| {
        Error::execution_error()
            .with_reason(format!("Tool execution error: {err}"))
    })
}

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn execute(&self, host: &mut dyn HostAdapter, arguments: Value)
    -> ToolResult;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    #[inline]
    fn execute(
        &self,
        host: &mut dyn HostAdapter,
        arguments: Value,
    ) -> ToolResult {
        let input: T::Input =
            serde_json::from_value(arguments).map_err(|err| {
                Error::invalid_input()
                    .with_reason(format!("Invalid arguments: {err}"))
            })?;
        self.0.execute(host, input)
    }
}

#[rustfmt::skip]
type HandlerFn = Box<
    dyn Fn(&mut dyn HostAdapter, Value) -> ToolResult + Send + Sync
>;

/// A tool made of a name, a description, a schema and a handler taking
/// the raw argument object.
pub(crate) struct FnTool {
    pub name: String,
    pub description: String,
    pub parameter_schema: Value,
    pub handler: HandlerFn,
}

impl ToolObject for FnTool {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[inline]
    fn execute(
        &self,
        host: &mut dyn HostAdapter,
        arguments: Value,
    ) -> ToolResult {
        (self.handler)(host, arguments)
    }
}
