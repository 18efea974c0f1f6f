use seekloop_core::tool::{Tool, define};
use seekloop_core::{Error, Orchestrator, OrchestratorBuilder};
use seekloop_model::{ChatRequest, ChatRequestBuilder, ToolDefinition, Transport};

/// The model used when none is specified.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    orchestrator_builder: OrchestratorBuilder,
    model: String,
    system_prompt: Option<String>,
    tools: Vec<ToolDefinition>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified transport.
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self {
            orchestrator_builder: OrchestratorBuilder::with_transport(transport),
            model: DEFAULT_MODEL.to_owned(),
            system_prompt: None,
            tools: vec![],
        }
    }

    /// Sets the model to talk to.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the system prompt sent before every question.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a typed tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(define(tool));
        self
    }

    /// Registers a tool definition built by hand.
    #[inline]
    pub fn with_tool_definition(mut self, definition: ToolDefinition) -> Self {
        self.tools.push(definition);
        self
    }

    /// Sets the maximum number of turns per question.
    #[inline]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.orchestrator_builder =
            self.orchestrator_builder.with_max_turns(max_turns);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        Session {
            orchestrator: self.orchestrator_builder.build(),
            model: self.model,
            system_prompt: self.system_prompt,
            tools: self.tools,
        }
    }
}

/// A question-answering session.
///
/// Every question starts a fresh conversation made of the system prompt
/// and the question, so questions don't see each other. The session is
/// basically a wrapper around [`Orchestrator`].
pub struct Session {
    orchestrator: Orchestrator,
    model: String,
    system_prompt: Option<String>,
    tools: Vec<ToolDefinition>,
}

impl Session {
    /// Returns the model of this session.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Builds the initial request for a question.
    pub fn request(&self, question: &str) -> ChatRequest {
        let mut builder = ChatRequestBuilder::with_model(&self.model);
        if let Some(prompt) = &self.system_prompt {
            builder = builder.add_system_message(prompt);
        }
        builder
            .add_user_message(question)
            .with_tools(self.tools.iter().cloned())
            .build()
    }

    /// Asks a question and returns the final answer of the model.
    pub async fn ask(&self, question: &str) -> Result<String, Error> {
        let report = self
            .orchestrator
            .run_with_report(self.request(question))
            .await?;
        info!("answered in {} turns", report.turns);

        match report.response.assistant_content() {
            Some(answer) => Ok(answer.to_owned()),
            None => Err(Error::MalformedResponse(
                "final answer has no content".to_owned(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use seekloop_core::{CapabilityError, Feature, ModelTier};
    use seekloop_model::{Role, ToolCall};
    use seekloop_test_transport::{PresetResponse, TestTransport};

    use super::*;
    use crate::tools::WeatherTool;

    #[test]
    fn test_request() {
        let session = SessionBuilder::with_transport(TestTransport::default())
            .with_system_prompt("Be brief.")
            .with_tool(WeatherTool::new())
            .build();
        assert_eq!(session.model(), DEFAULT_MODEL);

        let request = session.request("How's the weather in Paris?");
        assert_eq!(request.model, "deepseek-chat");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.tools.len(), 1);
        assert_eq!(request.tools[0].name, "get_weather");
    }

    #[tokio::test]
    async fn test_ask() {
        let transport = TestTransport::default();
        transport.add_response_step(PresetResponse::with_tool_calls([
            ToolCall::function(
                "call_0",
                "get_weather",
                Some(r#"{"city":"Paris"}"#.to_owned()),
            ),
        ]));
        transport.add_response_step(PresetResponse::with_content(
            "It's partly cloudy in Paris.",
        ));

        let session = SessionBuilder::with_transport(transport.clone())
            .with_model("deepseek-chat")
            .with_tool(WeatherTool::new())
            .build();
        let answer = session.ask("How's the weather in Paris?").await.unwrap();
        assert_eq!(answer, "It's partly cloudy in Paris.");

        let requests = transport.requests();
        let tool_message = &requests[1].messages[2];
        assert_eq!(tool_message.role, Role::Tool);
        assert_eq!(
            tool_message.content.as_deref(),
            Some(r#"{"city":"Paris","forecast":"Partly cloudy"}"#)
        );
    }

    #[tokio::test]
    async fn test_turn_limit() {
        let transport = TestTransport::default();
        transport.add_response_step(PresetResponse::with_tool_calls([
            ToolCall::function(
                "call_0",
                "get_weather",
                Some(r#"{"city":"Tokyo"}"#.to_owned()),
            ),
        ]));

        let session = SessionBuilder::with_transport(transport)
            .with_tool(WeatherTool::new())
            .with_max_turns(1)
            .build();
        let err = session.ask("Weather?").await.unwrap_err();
        assert!(matches!(err, Error::TurnLimitExceeded { max_turns: 1 }));
    }

    #[tokio::test]
    async fn test_reasoning_model_without_tools() {
        let model = "deepseek-reasoner";
        let transport = TestTransport::default();
        transport.add_response_step(
            PresetResponse::with_content("9.8 is greater.")
                .with_reasoning("Compare the tenths first."),
        );

        let mut builder = SessionBuilder::with_transport(transport.clone());
        if ModelTier::of(model).supports_tools() {
            builder = builder.with_tool(WeatherTool::new());
        }
        let session = builder.with_model(model).build();
        let answer = session.ask("9.11 and 9.8, which is greater?").await.unwrap();
        assert_eq!(answer, "9.8 is greater.");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].tools.is_empty());

        let err = SessionBuilder::with_transport(transport.clone())
            .with_model(model)
            .with_tool(WeatherTool::new())
            .build()
            .ask("Weather in Tokyo?")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Capability(CapabilityError::UnsupportedFeature {
                feature: Feature::Tools,
                ..
            })
        ));
        assert_eq!(transport.invocations(), 1);
    }
}
