//! Tool call supports.

mod dispatcher;
mod object;
mod registry;

use seekloop_model::{ToolDefinition, ToolError};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use dispatcher::ToolDispatcher;
use object::ToolObjectImpl;
pub use registry::ToolIndex;

/// The result of a tool call.
pub type ToolResult = Result<String, ToolError>;

/// A tool with a typed input that can be called by the model.
///
/// This is a typed alternative to building a [`ToolDefinition`] from a
/// raw callback by hand. Use [`define`] to turn a tool into a definition
/// that can be attached to a request.
///
/// Implementations should be stateless. A tool that needs context, such
/// as a working directory, should receive it during initialization and
/// keep it as immutable state.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This runs synchronously and blocks the orchestration run until it
    /// returns. An empty result is reported as an error.
    fn call(&self, input: Self::Input) -> ToolResult;
}

/// Converts a typed tool into a definition.
///
/// Arguments that don't deserialize into `T::Input` are rejected with an
/// [`InvalidInput`](seekloop_model::ToolErrorKind::InvalidInput) error
/// before the tool runs.
pub fn define<T: Tool>(tool: T) -> ToolDefinition {
    let name = tool.name().to_owned();
    let description = tool.description().to_owned();
    let parameters = tool.parameter_schema().clone();
    ToolDefinition::new(name, description, parameters, ToolObjectImpl(tool))
}
