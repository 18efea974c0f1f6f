use serde::{Deserialize, Serialize};

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The system instructions.
    System,
    /// The user input.
    User,
    /// The model.
    Assistant,
    /// A tool call result.
    Tool,
}

/// A message in the conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// The author of this message.
    pub role: Role,
    /// The text content. Assistant messages that only carry tool calls
    /// have no content.
    #[serde(default)]
    pub content: Option<String>,
    /// An optional participant name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The tool call this message answers. Required for `tool` messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls announced by an assistant message.
    ///
    /// These are replayed as-is, since the service only accepts a `tool`
    /// message whose id was announced by an earlier assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    #[inline]
    fn with_role(role: Role, content: Option<String>) -> Self {
        Self {
            role,
            content,
            name: None,
            tool_call_id: None,
            tool_calls: None,
        }
    }

    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::with_role(Role::System, Some(content.into()))
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::with_role(Role::User, Some(content.into()))
    }

    /// Creates an assistant message with text content.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::with_role(Role::Assistant, Some(content.into()))
    }

    /// Creates a tool result message answering the tool call `id`.
    #[inline]
    pub fn tool<S1: Into<String>, S2: Into<String>>(id: S1, content: S2) -> Self {
        Self {
            tool_call_id: Some(id.into()),
            ..Self::with_role(Role::Tool, Some(content.into()))
        }
    }

    /// Sets the participant name. Blank names are ignored.
    #[inline]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.name = Some(name);
        }
        self
    }

    /// Returns `true` if this message announces at least one tool call.
    #[inline]
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }
}

/// A tool call issued by the model.
///
/// All fields are optional on the wire. The dispatcher decides which
/// absences are tolerable and which make the call malformed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCall {
    /// The unique identifier for the tool call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The type of the call, always `function` for now.
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    /// The function to call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCall>,
}

impl ToolCall {
    /// Creates a function tool call.
    #[inline]
    pub fn function<S1: Into<String>, S2: Into<String>>(
        id: S1,
        name: S2,
        arguments: Option<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            kind: Some("function".to_owned()),
            function: Some(FunctionCall {
                name: Some(name.into()),
                arguments,
            }),
        }
    }
}

/// The function part of a tool call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The name of the tool to call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The raw argument string, expected to be a JSON object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_messages() {
        let msg = Message::user("Hello").with_name("alice");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "role": "user", "content": "Hello", "name": "alice" })
        );

        let msg = Message::tool("call_0", "{}");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "role": "tool", "content": "{}", "tool_call_id": "call_0" })
        );

        // Tool-call-only assistant messages keep a `null` content.
        let msg = Message {
            tool_calls: Some(vec![ToolCall::function("call_0", "noop", None)]),
            ..Message::with_role(Role::Assistant, None)
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_0",
                    "type": "function",
                    "function": { "name": "noop" }
                }]
            })
        );
        assert!(msg.has_tool_calls());
    }

    #[test]
    fn test_blank_name_is_ignored() {
        let msg = Message::system("Be brief.").with_name("  ");
        assert_eq!(msg.name, None);
    }
}
