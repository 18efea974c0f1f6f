use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A callback invoked when the model calls a tool.
///
/// Callbacks run synchronously on the orchestrator's thread of control
/// and always run to completion once started. They should return
/// `Err` instead of panicking, although a panic is caught and reported
/// as an execution error as well.
pub trait ToolCallback: Send + Sync {
    /// Handles one tool call and returns its textual result, typically
    /// a JSON document.
    fn call(&self, context: &ToolCallContext) -> Result<String, ToolError>;
}

impl<F> ToolCallback for F
where
    F: Fn(&ToolCallContext) -> Result<String, ToolError> + Send + Sync,
{
    #[inline]
    fn call(&self, context: &ToolCallContext) -> Result<String, ToolError> {
        self(context)
    }
}

/// The arguments the model provided when calling a tool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolCallContext {
    call_id: String,
    arguments: Map<String, Value>,
}

impl ToolCallContext {
    /// Creates a context for the tool call `call_id`.
    #[inline]
    pub fn new<S: Into<String>>(
        call_id: S,
        arguments: Map<String, Value>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            arguments,
        }
    }

    /// Returns the id of the tool call being handled.
    #[inline]
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Returns the argument object. It is empty when the model sent no
    /// arguments.
    #[inline]
    pub fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }

    /// Returns a single argument.
    #[inline]
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Deserializes the arguments into a typed input.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.arguments.clone())).map_err(
            |err| ToolError::invalid_input().with_reason(err.to_string()),
        )
    }
}

/// Describes a tool that the model may call.
///
/// Definitions are built by the caller before the first turn and shared
/// read-only by every turn of a run.
#[derive(Clone)]
pub struct ToolDefinition {
    /// Name of the tool, unique within one request.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// This is an opaque [JSON schema](https://json-schema.org/)
    /// document embedded as-is into the request payload.
    pub parameters: Value,
    callback: Arc<dyn ToolCallback>,
}

impl ToolDefinition {
    /// Creates a new tool definition.
    #[inline]
    pub fn new<S1, S2, C>(
        name: S1,
        description: S2,
        parameters: Value,
        callback: C,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        C: ToolCallback + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            callback: Arc::new(callback),
        }
    }

    /// Returns the callback of this tool.
    #[inline]
    pub fn callback(&self) -> &dyn ToolCallback {
        self.callback.as_ref()
    }
}

impl Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// The kind of a tool error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolErrorKind {
    /// The arguments provided to the tool were invalid.
    InvalidInput,
    /// Error occurred while executing the tool.
    ExecutionError,
    /// The tool produced no result.
    EmptyResult,
}

impl Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolErrorKind::InvalidInput => write!(f, "Invalid input"),
            ToolErrorKind::ExecutionError => write!(f, "Execution error"),
            ToolErrorKind::EmptyResult => write!(f, "Empty result"),
        }
    }
}

/// Describes a tool call error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolError {
    kind: ToolErrorKind,
    reason: Option<String>,
}

impl ToolError {
    /// Creates a new error with the `InvalidInput` kind.
    #[inline]
    pub fn invalid_input() -> Self {
        Self {
            kind: ToolErrorKind::InvalidInput,
            reason: None,
        }
    }

    /// Creates a new error with the `ExecutionError` kind.
    #[inline]
    pub fn execution_error() -> Self {
        Self {
            kind: ToolErrorKind::ExecutionError,
            reason: None,
        }
    }

    /// Creates a new error with the `EmptyResult` kind.
    #[inline]
    pub fn empty_result() -> Self {
        Self {
            kind: ToolErrorKind::EmptyResult,
            reason: None,
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ToolErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for ToolError {}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Deserialize)]
    struct Location {
        city: String,
    }

    fn context(arguments: Value) -> ToolCallContext {
        let Value::Object(arguments) = arguments else {
            unreachable!("arguments must be an object");
        };
        ToolCallContext::new("call_0", arguments)
    }

    #[test]
    fn test_closure_callback() {
        let tool = ToolDefinition::new(
            "echo",
            "Echoes the `text` argument.",
            json!({ "type": "object" }),
            |ctx: &ToolCallContext| {
                ctx.argument("text")
                    .and_then(Value::as_str)
                    .map(ToOwned::to_owned)
                    .ok_or_else(ToolError::invalid_input)
            },
        );
        let result = tool.callback().call(&context(json!({ "text": "hi" })));
        assert_eq!(result.unwrap(), "hi");

        let err = tool.callback().call(&context(json!({}))).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::InvalidInput);
        assert_eq!(err.reason(), "Invalid input");
    }

    #[test]
    fn test_parse_arguments() {
        let ctx = context(json!({ "city": "Berlin" }));
        let location: Location = ctx.parse().unwrap();
        assert_eq!(location.city, "Berlin");

        let err = context(json!({})).parse::<Location>().err().unwrap();
        assert_eq!(err.kind(), ToolErrorKind::InvalidInput);
        assert!(err.reason().contains("city"));
    }

    #[test]
    fn test_debug_hides_callback() {
        let tool = ToolDefinition::new(
            "noop",
            "Does nothing.",
            Value::Null,
            |_: &ToolCallContext| Ok("done".to_owned()),
        );
        let debug = format!("{tool:?}");
        assert!(debug.starts_with("ToolDefinition { name: \"noop\""));
    }
}
