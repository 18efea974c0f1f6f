//! Pre-flight checks of a request against what the target model supports.
//!
//! Capability mismatches are configuration errors of the caller, so they
//! are reported before any network round trip instead of surfacing later
//! as remote errors.

use std::fmt::{self, Display};

use seekloop_model::{ChatRequest, ResponseFormat};

use crate::error::{CapabilityError, Feature};

/// The capability tier of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelTier {
    /// A general chat model. No extra restriction applies.
    Chat,
    /// A reasoning model. It ignores sampling parameters and supports
    /// neither tools, structured output nor log probabilities.
    Reasoning,
}

static MODEL_TIERS: &[(&str, ModelTier)] =
    &[("deepseek-reasoner", ModelTier::Reasoning)];

impl ModelTier {
    /// Looks up the tier of a model. Unknown models are chat models.
    pub fn of(model: &str) -> Self {
        MODEL_TIERS
            .iter()
            .find(|(id, _)| *id == model)
            .map(|(_, tier)| *tier)
            .unwrap_or(ModelTier::Chat)
    }

    /// Returns whether requests to this tier may carry tool definitions.
    #[inline]
    pub fn supports_tools(self) -> bool {
        self == ModelTier::Chat
    }
}

/// A sampling parameter that is accepted but ignored by the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IneffectiveParameter {
    /// `temperature`
    Temperature,
    /// `top_p`
    TopP,
    /// `presence_penalty`
    PresencePenalty,
    /// `frequency_penalty`
    FrequencyPenalty,
}

impl IneffectiveParameter {
    /// Returns the wire name of this parameter.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            IneffectiveParameter::Temperature => "temperature",
            IneffectiveParameter::TopP => "top_p",
            IneffectiveParameter::PresencePenalty => "presence_penalty",
            IneffectiveParameter::FrequencyPenalty => "frequency_penalty",
        }
    }
}

impl Display for IneffectiveParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks a request against the capabilities of its target model.
///
/// On success, returns the sampling parameters that were set but will be
/// ignored by the model. They are also logged as warnings.
pub fn validate(
    request: &ChatRequest,
) -> Result<Vec<IneffectiveParameter>, CapabilityError> {
    let model = request.model.as_str();
    if model.trim().is_empty() {
        return Err(CapabilityError::EmptyModel);
    }

    let unsupported = |feature| CapabilityError::UnsupportedFeature {
        feature,
        model: model.to_owned(),
    };

    if request.stream {
        return Err(unsupported(Feature::Stream));
    }

    let tier = ModelTier::of(model);
    if tier == ModelTier::Chat {
        return Ok(vec![]);
    }

    let sampling = [
        (IneffectiveParameter::Temperature, request.temperature),
        (IneffectiveParameter::TopP, request.top_p),
        (IneffectiveParameter::PresencePenalty, request.presence_penalty),
        (IneffectiveParameter::FrequencyPenalty, request.frequency_penalty),
    ];
    let ineffective: Vec<_> = sampling
        .into_iter()
        .filter(|(_, value)| value.is_some())
        .map(|(param, _)| param)
        .collect();
    for param in &ineffective {
        warn!("parameter `{param}` is ignored by model `{model}`");
    }

    if !request.tools.is_empty() && !tier.supports_tools() {
        return Err(unsupported(Feature::Tools));
    }
    if request
        .tool_choice
        .as_ref()
        .is_some_and(|choice| !choice.is_directive_only())
    {
        return Err(unsupported(Feature::ToolChoice));
    }
    if request.response_format == Some(ResponseFormat::JsonObject) {
        return Err(unsupported(Feature::ResponseFormat));
    }
    if request.logprobs == Some(true) || request.top_logprobs.is_some() {
        return Err(unsupported(Feature::Logprobs));
    }

    Ok(ineffective)
}

#[cfg(test)]
mod tests {
    use seekloop_model::{
        ChatRequestBuilder, ToolCallContext, ToolChoice, ToolDefinition,
        ToolError,
    };
    use serde_json::json;

    use super::*;

    fn echo(context: &ToolCallContext) -> Result<String, ToolError> {
        Ok(context.call_id().to_owned())
    }

    fn reasoner() -> ChatRequestBuilder {
        ChatRequestBuilder::with_model("deepseek-reasoner")
            .add_user_message("9.11 and 9.8, which is greater?")
    }

    fn rejected(feature: Feature) -> Result<Vec<IneffectiveParameter>, CapabilityError> {
        Err(CapabilityError::UnsupportedFeature {
            feature,
            model: "deepseek-reasoner".to_owned(),
        })
    }

    #[test]
    fn test_model_tier() {
        assert_eq!(ModelTier::of("deepseek-reasoner"), ModelTier::Reasoning);
        assert_eq!(ModelTier::of("deepseek-chat"), ModelTier::Chat);
        assert_eq!(ModelTier::of("my-finetune"), ModelTier::Chat);

        assert!(ModelTier::Chat.supports_tools());
        assert!(!ModelTier::Reasoning.supports_tools());
    }

    #[test]
    fn test_empty_model() {
        let request = ChatRequestBuilder::with_model("  ").build();
        assert_eq!(validate(&request), Err(CapabilityError::EmptyModel));
    }

    #[test]
    fn test_stream_rejected_for_every_tier() {
        let request = ChatRequestBuilder::with_model("deepseek-chat")
            .with_stream(true)
            .build();
        assert!(matches!(
            validate(&request),
            Err(CapabilityError::UnsupportedFeature {
                feature: Feature::Stream,
                ..
            })
        ));
        assert_eq!(
            validate(&reasoner().with_stream(true).build()),
            rejected(Feature::Stream)
        );
    }

    #[test]
    fn test_chat_tier_is_unrestricted() {
        let request = ChatRequestBuilder::with_model("deepseek-chat")
            .with_temperature(1.3)
            .with_response_format(ResponseFormat::JsonObject)
            .with_tool_choice(ToolChoice::Required)
            .with_logprobs(true)
            .with_top_logprobs(3)
            .build();
        assert_eq!(validate(&request), Ok(vec![]));
    }

    #[test]
    fn test_reasoning_tier_sampling_warnings() {
        let request = reasoner()
            .with_temperature(0.2)
            .with_frequency_penalty(0.5)
            .with_max_tokens(1024)
            .build();
        assert_eq!(
            validate(&request),
            Ok(vec![
                IneffectiveParameter::Temperature,
                IneffectiveParameter::FrequencyPenalty
            ])
        );
    }

    #[test]
    fn test_reasoning_tier_rejections() {
        let tool = ToolDefinition::new("echo", "Echoes.", json!({}), echo);
        assert_eq!(
            validate(&reasoner().with_tool(tool).build()),
            rejected(Feature::Tools)
        );

        assert_eq!(
            validate(&reasoner().with_tool_choice(ToolChoice::Auto).build()),
            Ok(vec![])
        );
        assert_eq!(
            validate(&reasoner().with_tool_choice(ToolChoice::None).build()),
            Ok(vec![])
        );
        assert_eq!(
            validate(&reasoner().with_tool_choice(ToolChoice::Required).build()),
            rejected(Feature::ToolChoice)
        );
        assert_eq!(
            validate(
                &reasoner()
                    .with_tool_choice(ToolChoice::Function("echo".to_owned()))
                    .build()
            ),
            rejected(Feature::ToolChoice)
        );

        assert_eq!(
            validate(
                &reasoner()
                    .with_response_format(ResponseFormat::JsonObject)
                    .build()
            ),
            rejected(Feature::ResponseFormat)
        );
        assert_eq!(
            validate(&reasoner().with_response_format(ResponseFormat::Text).build()),
            Ok(vec![])
        );

        assert_eq!(
            validate(&reasoner().with_logprobs(true).build()),
            rejected(Feature::Logprobs)
        );
        assert_eq!(
            validate(&reasoner().with_logprobs(false).build()),
            Ok(vec![])
        );
        assert_eq!(
            validate(&reasoner().with_top_logprobs(2).build()),
            rejected(Feature::Logprobs)
        );
    }
}
