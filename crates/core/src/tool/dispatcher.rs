use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use seekloop_model::{Message, ToolCall, ToolCallContext, ToolError};
use serde_json::{Map, Value};

use super::ToolIndex;
use crate::Error;

/// Executes the tool calls issued by the model.
///
/// Calls are handled one at a time on the caller's thread. Any failure is
/// fatal for the run: tool side effects are not assumed to be repeatable,
/// so nothing is retried.
#[derive(Clone, Debug, Default)]
pub struct ToolDispatcher {
    index: ToolIndex,
}

impl ToolDispatcher {
    /// Creates a dispatcher over the given tools.
    #[inline]
    pub fn new(index: ToolIndex) -> Self {
        Self { index }
    }

    /// Executes one tool call and returns the `tool` message answering it.
    pub fn dispatch(&self, call: &ToolCall) -> Result<Message, Error> {
        let id = call
            .id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                Error::MalformedToolCall("tool call has no id".to_owned())
            })?;
        let function = call.function.as_ref().ok_or_else(|| {
            Error::MalformedToolCall(format!("tool call `{id}` has no function"))
        })?;
        let name = function
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                Error::MalformedToolCall(format!(
                    "tool call `{id}` has a blank name"
                ))
            })?;

        let span = debug_span!("tool dispatcher", tool = name, id);
        let _enter = span.enter();

        let Some(tool) = self.index.get(name) else {
            warn!("tool not found: {name}");
            return Err(Error::UnknownTool(name.to_owned()));
        };
        let arguments = parse_arguments(id, function.arguments.as_deref())?;
        trace!("calling the tool with args: {arguments:?}");

        let context = ToolCallContext::new(id, arguments);
        let result =
            panic::catch_unwind(AssertUnwindSafe(|| tool.callback().call(&context)));
        let failure = |source: ToolError| {
            error!("tool failed: {source}");
            Error::ToolExecution {
                name: name.to_owned(),
                source,
            }
        };
        let content = match result {
            Ok(Ok(content)) => content,
            Ok(Err(err)) => return Err(failure(err)),
            Err(payload) => {
                let reason = format!("panicked: {}", panic_message(&*payload));
                return Err(failure(
                    ToolError::execution_error().with_reason(reason),
                ));
            }
        };
        if content.is_empty() {
            return Err(failure(ToolError::empty_result()));
        }

        trace!("tool returned {} bytes", content.len());
        Ok(Message::tool(id, content))
    }
}

/// Absent arguments are an empty object. Present arguments must be a
/// JSON object.
fn parse_arguments(
    id: &str,
    raw: Option<&str>,
) -> Result<Map<String, Value>, Error> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str(raw) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(other) => Err(Error::MalformedToolCall(format!(
            "arguments of tool call `{id}` are not an object: {other}"
        ))),
        Err(err) => Err(Error::MalformedToolCall(format!(
            "arguments of tool call `{id}` are not valid JSON: {err}"
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use seekloop_model::{
        FunctionCall, Role, ToolDefinition, ToolErrorKind,
    };
    use serde_json::json;

    use super::*;

    fn echo(context: &ToolCallContext) -> Result<String, ToolError> {
        Ok(Value::Object(context.arguments().clone()).to_string())
    }

    fn silent(_: &ToolCallContext) -> Result<String, ToolError> {
        Ok(String::new())
    }

    fn failing(_: &ToolCallContext) -> Result<String, ToolError> {
        Err(ToolError::execution_error().with_reason("disk full"))
    }

    fn panicking(_: &ToolCallContext) -> Result<String, ToolError> {
        panic!("boom")
    }

    fn dispatcher() -> ToolDispatcher {
        ToolDispatcher::new(ToolIndex::from_definitions(&[
            ToolDefinition::new("echo", "Echoes.", json!({}), echo),
            ToolDefinition::new("silent", "Says nothing.", json!({}), silent),
            ToolDefinition::new("failing", "Fails.", json!({}), failing),
            ToolDefinition::new("panicking", "Panics.", json!({}), panicking),
        ]))
    }

    fn call(name: &str, arguments: Option<&str>) -> ToolCall {
        ToolCall::function("call_0", name, arguments.map(str::to_owned))
    }

    #[test]
    fn test_dispatch() {
        let message = dispatcher()
            .dispatch(&call("echo", Some(r#"{"city":"Berlin"}"#)))
            .unwrap();
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("call_0"));
        assert_eq!(message.content.as_deref(), Some(r#"{"city":"Berlin"}"#));
    }

    #[test]
    fn test_absent_arguments() {
        let message = dispatcher().dispatch(&call("echo", None)).unwrap();
        assert_eq!(message.content.as_deref(), Some("{}"));
    }

    #[test]
    fn test_malformed_calls() {
        let dispatcher = dispatcher();

        let no_id = ToolCall {
            id: None,
            ..call("echo", None)
        };
        let no_function = ToolCall {
            function: None,
            ..call("echo", None)
        };
        let blank_name = ToolCall {
            function: Some(FunctionCall {
                name: Some("  ".to_owned()),
                arguments: None,
            }),
            ..call("echo", None)
        };
        let malformed = [
            no_id,
            no_function,
            blank_name,
            call("echo", Some("")),
            call("echo", Some("{not json")),
            call("echo", Some("[1, 2]")),
        ];
        for call in &malformed {
            let err = dispatcher.dispatch(call).unwrap_err();
            assert!(matches!(err, Error::MalformedToolCall(_)), "{err:?}");
        }
    }

    #[test]
    fn test_unknown_tool() {
        let err = dispatcher()
            .dispatch(&call("get_stock_price", Some("{}")))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTool(name) if name == "get_stock_price"));
    }

    #[test]
    fn test_tool_failures() {
        let dispatcher = dispatcher();

        let expect_failure = |name: &str, kind: ToolErrorKind| {
            match dispatcher.dispatch(&call(name, None)).unwrap_err() {
                Error::ToolExecution { name: failed, source } => {
                    assert_eq!(failed, name);
                    assert_eq!(source.kind(), kind);
                    source
                }
                err => panic!("unexpected error: {err:?}"),
            }
        };

        expect_failure("silent", ToolErrorKind::EmptyResult);
        let source = expect_failure("failing", ToolErrorKind::ExecutionError);
        assert_eq!(source.reason(), "disk full");
        let source = expect_failure("panicking", ToolErrorKind::ExecutionError);
        assert_eq!(source.reason(), "panicked: boom");
    }
}
