use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::{Role, ToolCall};

/// The parsed result of one turn.
///
/// Envelope fields are optional: an error payload from the service
/// carries none of them, and the orchestrator decides which absences
/// make a document unusable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseDocument {
    /// The unique identifier of the completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The object type, always `chat.completion`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// The Unix timestamp (in seconds) of when the completion was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
    /// The model that produced the completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// The backend configuration that served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    /// The completion choices.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Usage statistics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// An application-level error reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ResponseDocument {
    /// Returns the first choice.
    #[inline]
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.first()
    }

    /// Returns the message content of the first choice.
    #[inline]
    pub fn assistant_content(&self) -> Option<&str> {
        self.first_choice()?.message.as_ref()?.content.as_deref()
    }

    /// Returns the finish reason of the first choice.
    #[inline]
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.first_choice()?.finish_reason
    }
}

/// A completion choice.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// The index of the choice.
    #[serde(default)]
    pub index: u32,
    /// Why the model stopped generating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// The generated message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,
    /// Log probability information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Logprobs>,
}

/// A message generated by the model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// The author, always `assistant`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// The text content.
    #[serde(default)]
    pub content: Option<String>,
    /// The reasoning trace of a reasoning model.
    ///
    /// It is meant for display only and must never be sent back to the
    /// model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    /// Tool calls requested by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// The reason why the model stopped generating.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model hit a natural stop point or a stop sequence.
    Stop,
    /// The token limit was reached.
    Length,
    /// Content was omitted by a content filter.
    ContentFilter,
    /// The model called tools.
    ToolCalls,
    /// The service ran out of resources during inference.
    InsufficientSystemResource,
    /// A reason this crate doesn't know about.
    #[serde(other)]
    Unknown,
}

/// Token usage statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Tokens in the completion.
    #[serde(default)]
    pub completion_tokens: u64,
    /// Total tokens used.
    #[serde(default)]
    pub total_tokens: u64,
    /// Prompt tokens served from the context cache.
    #[serde(default)]
    pub prompt_cache_hit_tokens: u64,
    /// Prompt tokens not served from the context cache.
    #[serde(default)]
    pub prompt_cache_miss_tokens: u64,
    /// A breakdown of the completion tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens_details: Option<CompletionTokensDetails>,
}

/// A breakdown of the completion tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionTokensDetails {
    /// Tokens spent on reasoning.
    #[serde(default)]
    pub reasoning_tokens: u64,
}

/// Log probability information of a choice.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Logprobs {
    /// Per-token information for the message content.
    #[serde(default)]
    pub content: Vec<TokenLogprob>,
}

/// Log probability information for one output token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenLogprob {
    /// The token.
    pub token: String,
    /// The log probability of the token.
    pub logprob: f64,
    /// The UTF-8 bytes of the token.
    #[serde(default)]
    pub bytes: Option<Vec<u8>>,
    /// The most likely alternatives at this position.
    #[serde(default)]
    pub top_logprobs: Vec<TopLogprob>,
}

/// One of the most likely alternative tokens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopLogprob {
    /// The token.
    pub token: String,
    /// The log probability of the token.
    pub logprob: f64,
    /// The UTF-8 bytes of the token.
    #[serde(default)]
    pub bytes: Option<Vec<u8>>,
}
