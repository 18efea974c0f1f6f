use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::json;

use crate::message::Message;
use crate::tool::ToolDefinition;

/// A request snapshot to be sent to the chat-completion service.
///
/// Snapshots are values: the orchestrator never mutates one, it builds
/// the next turn's snapshot from the initial request plus the updated
/// message history.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    /// The model identifier.
    pub model: String,
    /// The input messages.
    pub messages: Vec<Message>,
    /// Penalizes tokens by their frequency so far.
    pub frequency_penalty: Option<f64>,
    /// The maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Penalizes tokens that already appeared.
    pub presence_penalty: Option<f64>,
    /// The format the model must output.
    pub response_format: Option<ResponseFormat>,
    /// Sequences where the model stops generating.
    pub stop: Option<Stop>,
    /// Whether to stream the response. Not supported by the orchestrator.
    pub stream: bool,
    /// Options for streaming responses.
    pub stream_options: Option<StreamOptions>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Nucleus sampling probability mass.
    pub top_p: Option<f64>,
    /// Tools that are available to the model.
    pub tools: Vec<ToolDefinition>,
    /// Controls which tool, if any, the model calls.
    pub tool_choice: Option<ToolChoice>,
    /// Whether to return log probabilities of the output tokens.
    pub logprobs: Option<bool>,
    /// The number of most likely tokens to return at each position.
    pub top_logprobs: Option<u8>,
    /// The time budget for one exchange, including transport retries.
    pub timeout: Option<Duration>,
    /// A caller-supplied cancellation predicate.
    pub cancellation: Option<Cancellation>,
    /// A hook observing every raw exchange with the service.
    pub capture: Option<CaptureHook>,
}

impl ChatRequest {
    /// Creates a builder for the given model.
    #[inline]
    pub fn builder<S: Into<String>>(model: S) -> ChatRequestBuilder {
        ChatRequestBuilder::with_model(model)
    }
}

/// Builder for [`ChatRequest`].
#[derive(Clone, Debug)]
pub struct ChatRequestBuilder {
    request: ChatRequest,
}

impl ChatRequestBuilder {
    /// Creates a builder with the given model.
    #[inline]
    pub fn with_model<S: Into<String>>(model: S) -> Self {
        Self {
            request: ChatRequest {
                model: model.into(),
                messages: vec![],
                frequency_penalty: None,
                max_tokens: None,
                presence_penalty: None,
                response_format: None,
                stop: None,
                stream: false,
                stream_options: None,
                temperature: None,
                top_p: None,
                tools: vec![],
                tool_choice: None,
                logprobs: None,
                top_logprobs: None,
                timeout: None,
                cancellation: None,
                capture: None,
            },
        }
    }

    /// Appends a message.
    #[inline]
    pub fn with_message(mut self, message: Message) -> Self {
        self.request.messages.push(message);
        self
    }

    /// Appends several messages.
    #[inline]
    pub fn with_messages<I: IntoIterator<Item = Message>>(
        mut self,
        messages: I,
    ) -> Self {
        self.request.messages.extend(messages);
        self
    }

    /// Appends a system message.
    #[inline]
    pub fn add_system_message<S: Into<String>>(self, content: S) -> Self {
        self.with_message(Message::system(content))
    }

    /// Appends a user message.
    #[inline]
    pub fn add_user_message<S: Into<String>>(self, content: S) -> Self {
        self.with_message(Message::user(content))
    }

    /// Appends an assistant message, e.g. a few-shot example.
    #[inline]
    pub fn add_assistant_message<S: Into<String>>(self, content: S) -> Self {
        self.with_message(Message::assistant(content))
    }

    /// Appends a system message on behalf of a named participant.
    #[inline]
    pub fn add_system_message_with_name<S1: Into<String>, S2: Into<String>>(
        self,
        content: S1,
        name: S2,
    ) -> Self {
        self.with_message(Message::system(content).with_name(name))
    }

    /// Appends a user message on behalf of a named participant.
    #[inline]
    pub fn add_user_message_with_name<S1: Into<String>, S2: Into<String>>(
        self,
        content: S1,
        name: S2,
    ) -> Self {
        self.with_message(Message::user(content).with_name(name))
    }

    /// Appends an assistant message on behalf of a named participant.
    #[inline]
    pub fn add_assistant_message_with_name<S1: Into<String>, S2: Into<String>>(
        self,
        content: S1,
        name: S2,
    ) -> Self {
        self.with_message(Message::assistant(content).with_name(name))
    }

    /// Appends a tool result message.
    #[inline]
    pub fn add_tool_message<S1: Into<String>, S2: Into<String>>(
        self,
        tool_call_id: S1,
        content: S2,
    ) -> Self {
        self.with_message(Message::tool(tool_call_id, content))
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.request.tools.push(tool);
        self
    }

    /// Registers several tools.
    #[inline]
    pub fn with_tools<I: IntoIterator<Item = ToolDefinition>>(
        mut self,
        tools: I,
    ) -> Self {
        self.request.tools.extend(tools);
        self
    }

    /// Sets the tool choice directive.
    #[inline]
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.request.tool_choice = Some(tool_choice);
        self
    }

    /// Sets the frequency penalty.
    #[inline]
    pub fn with_frequency_penalty(mut self, value: f64) -> Self {
        self.request.frequency_penalty = Some(value);
        self
    }

    /// Sets the presence penalty.
    #[inline]
    pub fn with_presence_penalty(mut self, value: f64) -> Self {
        self.request.presence_penalty = Some(value);
        self
    }

    /// Sets the maximum number of tokens to generate.
    #[inline]
    pub fn with_max_tokens(mut self, value: u32) -> Self {
        self.request.max_tokens = Some(value);
        self
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, value: f64) -> Self {
        self.request.temperature = Some(value);
        self
    }

    /// Sets the nucleus sampling probability mass.
    #[inline]
    pub fn with_top_p(mut self, value: f64) -> Self {
        self.request.top_p = Some(value);
        self
    }

    /// Sets the response format.
    #[inline]
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.request.response_format = Some(format);
        self
    }

    /// Sets the stop sequences.
    #[inline]
    pub fn with_stop<S: Into<Stop>>(mut self, stop: S) -> Self {
        self.request.stop = Some(stop.into());
        self
    }

    /// Enables or disables streaming.
    #[inline]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.request.stream = stream;
        self
    }

    /// Sets the stream options.
    #[inline]
    pub fn with_stream_options(mut self, options: StreamOptions) -> Self {
        self.request.stream_options = Some(options);
        self
    }

    /// Requests log probabilities of the output tokens.
    #[inline]
    pub fn with_logprobs(mut self, logprobs: bool) -> Self {
        self.request.logprobs = Some(logprobs);
        self
    }

    /// Sets how many of the most likely tokens to return per position.
    #[inline]
    pub fn with_top_logprobs(mut self, value: u8) -> Self {
        self.request.top_logprobs = Some(value);
        self
    }

    /// Sets the time budget of each exchange.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// Sets the cancellation predicate.
    #[inline]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.request.cancellation = Some(cancellation);
        self
    }

    /// Attaches a hook observing every raw exchange.
    #[inline]
    pub fn on_capture(
        mut self,
        on_capture: impl Fn(&Capture) + Send + Sync + 'static,
    ) -> Self {
        self.request.capture = Some(CaptureHook(Arc::new(on_capture)));
        self
    }

    /// Builds the request.
    #[inline]
    pub fn build(self) -> ChatRequest {
        self.request
    }
}

/// The format the model must output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text.
    Text,
    /// A valid JSON object.
    JsonObject,
}

/// Controls which tool, if any, the model calls.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ToolChoice {
    /// The model decides whether to call tools.
    Auto,
    /// The model must not call any tool.
    None,
    /// The model must call at least one tool.
    Required,
    /// The model must call the named function.
    Function(String),
}

impl ToolChoice {
    /// Returns `true` for the plain `auto` and `none` directives.
    #[inline]
    pub fn is_directive_only(&self) -> bool {
        matches!(self, ToolChoice::Auto | ToolChoice::None)
    }
}

impl Serialize for ToolChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ToolChoice::Auto => serializer.serialize_str("auto"),
            ToolChoice::None => serializer.serialize_str("none"),
            ToolChoice::Required => serializer.serialize_str("required"),
            ToolChoice::Function(name) => json!({
                "type": "function",
                "function": { "name": name }
            })
            .serialize(serializer),
        }
    }
}

/// Stop sequences, either a single string or a list of strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Stop {
    /// A single stop sequence.
    One(String),
    /// Several stop sequences.
    Many(Vec<String>),
}

impl From<&str> for Stop {
    #[inline]
    fn from(value: &str) -> Self {
        Stop::One(value.to_owned())
    }
}

impl From<String> for Stop {
    #[inline]
    fn from(value: String) -> Self {
        Stop::One(value)
    }
}

impl From<Vec<String>> for Stop {
    #[inline]
    fn from(value: Vec<String>) -> Self {
        Stop::Many(value)
    }
}

/// Options for streaming responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct StreamOptions {
    /// Whether to send a usage chunk before the end of the stream.
    pub include_usage: bool,
}

/// A cooperative cancellation predicate.
///
/// The transport checks it before and while an exchange is in flight.
/// A tool callback that has already started is never interrupted.
#[derive(Clone)]
pub struct Cancellation(Arc<dyn Fn() -> bool + Send + Sync>);

impl Cancellation {
    /// Creates a cancellation from a predicate returning `true` once the
    /// caller wants to stop.
    #[inline]
    pub fn from_fn(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Returns `true` if the caller has cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        (self.0)()
    }
}

impl Debug for Cancellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cancellation")
            .field(&self.is_cancelled())
            .finish()
    }
}

/// One raw exchange observed by a [`CaptureHook`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    /// The serialized request body.
    pub request_body: String,
    /// How the exchange ended.
    pub outcome: CaptureOutcome,
}

/// How a captured exchange ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The service answered successfully.
    Success {
        /// The HTTP status code.
        status: u16,
        /// The raw response body.
        body: String,
    },
    /// The exchange failed.
    Failure {
        /// The HTTP status code, if the service responded.
        status: Option<u16>,
        /// The error message.
        message: String,
    },
}

/// A hook observing raw exchanges, e.g. for auditing or debugging.
#[derive(Clone)]
pub struct CaptureHook(Arc<dyn Fn(&Capture) + Send + Sync>);

impl CaptureHook {
    /// Creates a hook from a function.
    #[inline]
    pub fn new(hook: impl Fn(&Capture) + Send + Sync + 'static) -> Self {
        Self(Arc::new(hook))
    }

    /// Reports an exchange to the hook.
    #[inline]
    pub fn capture(&self, capture: &Capture) {
        (self.0)(capture)
    }
}

impl Debug for CaptureHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureHook").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder() {
        let request = ChatRequestBuilder::with_model("deepseek-chat")
            .add_system_message("You are a helpful assistant.")
            .add_user_message("Hello")
            .with_temperature(0.3)
            .with_stop(vec!["\n\n".to_owned()])
            .build();
        assert_eq!(request.model, "deepseek-chat");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.stop, Some(Stop::Many(vec!["\n\n".to_owned()])));
        assert!(!request.stream);
        assert!(request.tools.is_empty());
    }

    #[test]
    fn test_named_messages() {
        let request = ChatRequestBuilder::with_model("deepseek-chat")
            .add_system_message_with_name("Answer in French.", "operator")
            .add_user_message_with_name("Hello", "alice")
            .add_assistant_message_with_name("Bonjour", " ")
            .build();
        assert_eq!(request.messages[0].name.as_deref(), Some("operator"));
        assert_eq!(request.messages[1].name.as_deref(), Some("alice"));
        assert_eq!(request.messages[2].name, None);

        let json = serde_json::to_value(&request.messages[1]).unwrap();
        assert_eq!(
            json,
            json!({ "role": "user", "content": "Hello", "name": "alice" })
        );
    }

    #[test]
    fn test_serialize_tool_choice() {
        assert_eq!(serde_json::to_value(ToolChoice::Auto).unwrap(), "auto");
        assert_eq!(
            serde_json::to_value(ToolChoice::Required).unwrap(),
            "required"
        );
        assert_eq!(
            serde_json::to_value(ToolChoice::Function("get_weather".into()))
                .unwrap(),
            json!({ "type": "function", "function": { "name": "get_weather" } })
        );
        assert!(ToolChoice::None.is_directive_only());
        assert!(!ToolChoice::Required.is_directive_only());
    }

    #[test]
    fn test_serialize_response_format() {
        assert_eq!(
            serde_json::to_value(ResponseFormat::JsonObject).unwrap(),
            json!({ "type": "json_object" })
        );
        assert_eq!(
            serde_json::to_value(Stop::from("END")).unwrap(),
            json!("END")
        );
    }

    #[test]
    fn test_cancellation() {
        let flag = Arc::new(AtomicBool::new(false));
        let cancellation = Cancellation::from_fn({
            let flag = Arc::clone(&flag);
            move || flag.load(Ordering::Relaxed)
        });
        assert!(!cancellation.is_cancelled());
        flag.store(true, Ordering::Relaxed);
        assert!(cancellation.clone().is_cancelled());
    }
}
