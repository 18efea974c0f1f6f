use std::fmt::{self, Display};

use seekloop_model::{ToolError, TransportError};
use serde_json::Value;

/// The error type of an orchestration run.
///
/// Every variant is terminal: the orchestrator never retries on its own,
/// and transient transport failures have already been retried by the
/// transport before they surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request asks for something the target model does not support.
    /// Detected before any turn executes.
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// The transport failed to complete an exchange.
    #[error("Transport error ({kind}): {0}", kind = .0.kind())]
    Transport(Box<dyn TransportError>),

    /// The service reported an application-level error payload.
    #[error("Remote error: {0}")]
    Remote(Value),

    /// The response envelope lacks required fields or is not parseable.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A tool call issued by the model is structurally invalid.
    #[error("Malformed tool call: {0}")]
    MalformedToolCall(String),

    /// The model called a tool that is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A tool callback failed, panicked or returned an empty result.
    #[error("Tool execution error ({name}): {source}")]
    ToolExecution {
        /// The name of the tool that failed.
        name: String,
        /// The underlying error.
        #[source]
        source: ToolError,
    },

    /// The run needed more turns than allowed.
    #[error("Turn limit exceeded: no final answer after {max_turns} turns")]
    TurnLimitExceeded {
        /// The configured bound.
        max_turns: usize,
    },
}

/// A pre-flight rejection of a request.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// The request names no model.
    #[error("Model must not be empty")]
    EmptyModel,

    /// The model does not support a requested feature.
    #[error("Unsupported feature `{feature}` for model `{model}`")]
    UnsupportedFeature {
        /// The rejected feature.
        feature: Feature,
        /// The target model.
        model: String,
    },
}

/// A request feature that may be unsupported by a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Streaming responses.
    Stream,
    /// Tool definitions.
    Tools,
    /// A tool choice other than `auto` or `none`.
    ToolChoice,
    /// The JSON object response format.
    ResponseFormat,
    /// Log probabilities.
    Logprobs,
}

impl Feature {
    /// Returns the wire name of this feature.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Stream => "stream",
            Feature::Tools => "tools",
            Feature::ToolChoice => "tool_choice",
            Feature::ResponseFormat => "response_format",
            Feature::Logprobs => "logprobs",
        }
    }
}

impl Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use seekloop_model::{ErrorKind, ToolErrorKind};

    use super::*;

    #[derive(Debug)]
    struct RateLimited;

    impl Display for RateLimited {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Rate limit or quota exceeded (HTTP 429)")
        }
    }

    impl std::error::Error for RateLimited {}

    impl TransportError for RateLimited {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Transient
        }

        fn status(&self) -> Option<u16> {
            Some(429)
        }
    }

    #[test]
    fn test_display() {
        let err = Error::from(CapabilityError::UnsupportedFeature {
            feature: Feature::Tools,
            model: "deepseek-reasoner".to_owned(),
        });
        assert_eq!(
            err.to_string(),
            "Unsupported feature `tools` for model `deepseek-reasoner`"
        );

        let err = Error::ToolExecution {
            name: "get_weather".to_owned(),
            source: ToolError::empty_result(),
        };
        assert_eq!(
            err.to_string(),
            "Tool execution error (get_weather): Empty result"
        );
        let source = std::error::Error::source(&err).unwrap();
        let source = source.downcast_ref::<ToolError>().unwrap();
        assert_eq!(source.kind(), ToolErrorKind::EmptyResult);
    }

    #[test]
    fn test_transport_display() {
        let err = Error::Transport(Box::new(RateLimited));
        assert_eq!(
            err.to_string(),
            "Transport error (transient error): \
             Rate limit or quota exceeded (HTTP 429)"
        );
        let Error::Transport(inner) = &err else {
            unreachable!();
        };
        assert_eq!(inner.kind(), ErrorKind::Transient);
        assert_eq!(inner.status(), Some(429));
    }
}
