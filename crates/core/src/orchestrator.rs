mod builder;

use seekloop_model::{ChatRequest, FinishReason, ResponseDocument};
use tracing::Instrument;

use crate::capability::{self, IneffectiveParameter};
use crate::conversation::{Conversation, history_message};
use crate::tool::{ToolDispatcher, ToolIndex};
use crate::turn::TurnExecutor;
use crate::Error;
pub use builder::OrchestratorBuilder;

/// The number of turns a run may take unless configured otherwise.
///
/// Enough for one tool round trip, a clarifying one and a final answer.
pub const DEFAULT_MAX_TURNS: usize = 4;

/// Configuration of an [`Orchestrator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OrchestratorConfig {
    /// The maximum number of turns of one run. A run that needs another
    /// turn after this many fails with
    /// [`TurnLimitExceeded`](Error::TurnLimitExceeded).
    pub max_turns: usize,
}

impl Default for OrchestratorConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

/// The outcome of a successful run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// The document of the final turn, unchanged.
    pub response: ResponseDocument,
    /// The full history: the seed messages followed by every assistant
    /// and tool message of the run.
    pub conversation: Conversation,
    /// The number of turns executed.
    pub turns: usize,
    /// Sampling parameters that the model ignored.
    pub ineffective_parameters: Vec<IneffectiveParameter>,
}

/// Drives a bounded tool-calling conversation with the model.
///
/// A run validates the request once, then executes turns until the model
/// answers without calling tools. Tool calls of each turn are dispatched
/// in order, and their results are appended to the conversation before
/// the next turn's request is built. Turns never overlap, and no error is
/// retried at this level.
///
/// Each run owns its conversation and tool index, so one orchestrator can
/// serve any number of runs.
#[derive(Clone)]
pub struct Orchestrator {
    executor: TurnExecutor,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Runs a conversation and returns the final response document.
    pub async fn run(
        &self,
        request: ChatRequest,
    ) -> Result<ResponseDocument, Error> {
        self.run_with_report(request)
            .await
            .map(|report| report.response)
    }

    /// Runs a conversation and returns the final response document along
    /// with the conversation state.
    pub async fn run_with_report(
        &self,
        request: ChatRequest,
    ) -> Result<RunReport, Error> {
        let span = info_span!("orchestrator run", model = %request.model);
        self.drive(request).instrument(span).await
    }

    async fn drive(&self, initial: ChatRequest) -> Result<RunReport, Error> {
        let ineffective_parameters = capability::validate(&initial)?;

        let mut conversation = Conversation::seeded(initial.messages.clone());
        let dispatcher =
            ToolDispatcher::new(ToolIndex::from_definitions(&initial.tools));
        let max_turns = self.config.max_turns;

        let mut request = initial.clone();
        let mut turn = 0;
        loop {
            turn += 1;
            if turn > max_turns {
                warn!("no final answer after {max_turns} turns");
                return Err(Error::TurnLimitExceeded { max_turns });
            }

            let document = self
                .executor
                .send(&request)
                .instrument(debug_span!("turn", turn))
                .await?;

            if let Some(error) = &document.error {
                error!("the service reported an error: {error}");
                return Err(Error::Remote(error.clone()));
            }
            let Some(choice) = document.first_choice() else {
                return Err(Error::MalformedResponse(
                    "response has no choice".to_owned(),
                ));
            };
            let Some(message) = &choice.message else {
                return Err(Error::MalformedResponse(
                    "first choice has no message".to_owned(),
                ));
            };
            let finish_reason = choice.finish_reason;
            let tool_calls = message.tool_calls.clone().unwrap_or_default();
            conversation.push(history_message(message));

            if tool_calls.is_empty() {
                // The tool call list is authoritative over the label.
                if finish_reason == Some(FinishReason::ToolCalls) {
                    warn!("finish reason claims tool calls, but none present");
                }
                debug!("got the final answer at turn {turn}");
                return Ok(RunReport {
                    response: document,
                    conversation,
                    turns: turn,
                    ineffective_parameters,
                });
            }

            if finish_reason != Some(FinishReason::ToolCalls) {
                warn!(
                    "got {} tool calls with finish reason {finish_reason:?}",
                    tool_calls.len()
                );
            }
            debug!("dispatching {} tool calls", tool_calls.len());
            for call in &tool_calls {
                conversation.push(dispatcher.dispatch(call)?);
            }

            request = conversation.next_request(&initial);
        }
    }
}
