use seekloop_model::{
    Choice, FinishReason, ResponseDocument, ResponseMessage, Role, ToolCall,
    Usage,
};

/// The preset response for one turn.
///
/// The finish reason is derived from the presence of tool calls unless
/// it is overridden, which allows scripting inconsistent responses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresetResponse {
    /// The assistant text.
    pub content: Option<String>,
    /// The reasoning trace, as sent by reasoning models.
    pub reasoning_content: Option<String>,
    /// Tool calls requested in this turn.
    pub tool_calls: Vec<ToolCall>,
    /// Overrides the derived finish reason.
    pub finish_reason: Option<FinishReason>,
}

impl PresetResponse {
    /// Creates a final answer with the specified text.
    #[inline]
    pub fn with_content<S: Into<String>>(content: S) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Creates a tool-call-only response.
    #[inline]
    pub fn with_tool_calls(tool_calls: impl Into<Vec<ToolCall>>) -> Self {
        Self {
            tool_calls: tool_calls.into(),
            ..Default::default()
        }
    }

    /// Attaches a reasoning trace.
    #[inline]
    pub fn with_reasoning<S: Into<String>>(mut self, reasoning: S) -> Self {
        self.reasoning_content = Some(reasoning.into());
        self
    }

    /// Overrides the finish reason.
    #[inline]
    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    /// Renders the preset into the document returned for turn `turn`.
    pub fn to_document(&self, model: &str, turn: usize) -> ResponseDocument {
        let finish_reason = self.finish_reason.unwrap_or(
            if self.tool_calls.is_empty() {
                FinishReason::Stop
            } else {
                FinishReason::ToolCalls
            },
        );
        ResponseDocument {
            id: Some(format!("resp:{turn}")),
            object: Some("chat.completion".to_owned()),
            created: Some(1_700_000_000 + turn as u64),
            model: Some(model.to_owned()),
            system_fingerprint: Some("fp_test".to_owned()),
            choices: vec![Choice {
                index: 0,
                finish_reason: Some(finish_reason),
                message: Some(ResponseMessage {
                    role: Some(Role::Assistant),
                    content: self.content.clone(),
                    reasoning_content: self.reasoning_content.clone(),
                    tool_calls: if self.tool_calls.is_empty() {
                        None
                    } else {
                        Some(self.tool_calls.clone())
                    },
                }),
                logprobs: None,
            }],
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
                prompt_cache_hit_tokens: 0,
                prompt_cache_miss_tokens: 10,
                completion_tokens_details: None,
            }),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_finish_reason() {
        let preset = PresetResponse::with_content("Hi");
        let document = preset.to_document("test-model", 1);
        assert_eq!(document.finish_reason(), Some(FinishReason::Stop));
        assert_eq!(document.assistant_content(), Some("Hi"));

        let preset = PresetResponse::with_tool_calls([ToolCall::function(
            "call_0", "noop", None,
        )]);
        let document = preset.to_document("test-model", 2);
        assert_eq!(document.finish_reason(), Some(FinishReason::ToolCalls));
        assert_eq!(document.id.as_deref(), Some("resp:2"));

        let preset = PresetResponse::with_content("Done")
            .with_finish_reason(FinishReason::ToolCalls);
        let document = preset.to_document("test-model", 3);
        assert_eq!(document.finish_reason(), Some(FinishReason::ToolCalls));
    }
}
