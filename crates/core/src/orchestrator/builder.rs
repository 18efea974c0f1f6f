use seekloop_model::Transport;

use super::{Orchestrator, OrchestratorConfig};
use crate::turn::TurnExecutor;

/// [`Orchestrator`] builder.
pub struct OrchestratorBuilder {
    executor: TurnExecutor,
    config: OrchestratorConfig,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the specified transport.
    #[inline]
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self {
            executor: TurnExecutor::new(transport),
            config: OrchestratorConfig::default(),
        }
    }

    /// Sets the maximum number of turns of one run.
    #[inline]
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.config.max_turns = max_turns;
        self
    }

    /// Replaces the whole configuration.
    #[inline]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the orchestrator.
    #[inline]
    pub fn build(self) -> Orchestrator {
        Orchestrator {
            executor: self.executor,
            config: self.config,
        }
    }
}
