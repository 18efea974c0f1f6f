use std::collections::HashMap;

use seekloop_model::ToolDefinition;

/// Maps tool names to their definitions.
///
/// The index is built once per run from the tools of the initial request
/// and is only read afterwards.
#[derive(Clone, Debug, Default)]
pub struct ToolIndex {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolIndex {
    /// Builds an index from tool definitions.
    ///
    /// Names are unique keys: when two definitions share a name, the
    /// later one wins.
    pub fn from_definitions(definitions: &[ToolDefinition]) -> Self {
        let mut tools = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            let name = definition.name.clone();
            if tools.insert(name, definition.clone()).is_some() {
                warn!("duplicate tool definition: {}", definition.name);
            }
        }
        Self { tools }
    }

    /// Looks up a tool by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Returns the number of tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use seekloop_model::{ToolCallContext, ToolError};
    use serde_json::json;

    use super::*;

    fn first(_: &ToolCallContext) -> Result<String, ToolError> {
        Ok("first".to_owned())
    }

    fn second(_: &ToolCallContext) -> Result<String, ToolError> {
        Ok("second".to_owned())
    }

    #[test]
    fn test_lookup() {
        let index = ToolIndex::from_definitions(&[
            ToolDefinition::new("lookup", "First.", json!({}), first),
            ToolDefinition::new("other", "Other.", json!({}), first),
            ToolDefinition::new("lookup", "Second.", json!({}), second),
        ]);
        assert_eq!(index.len(), 2);

        let tool = index.get("lookup").unwrap();
        assert_eq!(tool.description, "Second.");
        let context = ToolCallContext::default();
        assert_eq!(tool.callback().call(&context).unwrap(), "second");

        assert!(index.get("missing").is_none());
        assert!(ToolIndex::default().is_empty());
    }
}
