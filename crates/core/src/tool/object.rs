use seekloop_model::{ToolCallContext, ToolCallback, ToolError};

use super::Tool;

pub(crate) struct ToolObjectImpl<T: Tool>(pub T);

impl<T: Tool> ToolCallback for ToolObjectImpl<T> {
    fn call(&self, context: &ToolCallContext) -> Result<String, ToolError> {
        let span = debug_span!("tool call", tool = self.0.name());
        let _enter = span.enter();

        let input: T::Input = context.parse()?;
        trace!("calling tool ({}) with typed input", context.call_id());
        self.0.call(input)
    }
}

#[cfg(test)]
mod tests {
    use seekloop_model::ToolErrorKind;
    use serde::Deserialize;
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::tool::{ToolResult, define};

    static SCHEMA: &Value = &Value::Null;

    #[derive(Deserialize)]
    struct Input {
        a: i64,
        b: i64,
    }

    struct AddTool;

    impl Tool for AddTool {
        type Input = Input;

        fn name(&self) -> &str {
            "add"
        }

        fn description(&self) -> &str {
            "Adds two integers."
        }

        fn parameter_schema(&self) -> &Value {
            SCHEMA
        }

        fn call(&self, input: Self::Input) -> ToolResult {
            Ok((input.a + input.b).to_string())
        }
    }

    fn arguments(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_define() {
        let definition = define(AddTool);
        assert_eq!(definition.name, "add");
        assert_eq!(definition.description, "Adds two integers.");

        let context =
            ToolCallContext::new("call_0", arguments(json!({ "a": 1, "b": 2 })));
        assert_eq!(definition.callback().call(&context).unwrap(), "3");
    }

    #[test]
    fn test_invalid_input() {
        let definition = define(AddTool);
        let context =
            ToolCallContext::new("call_0", arguments(json!({ "a": "one" })));
        let err = definition.callback().call(&context).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::InvalidInput);
    }
}
