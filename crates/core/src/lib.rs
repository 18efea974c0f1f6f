//! Core logic including the orchestration loop, capability checks, tool
//! dispatch and the conversation state.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod capability;
pub mod conversation;
mod error;
mod orchestrator;
pub mod tool;
mod turn;

pub use capability::{IneffectiveParameter, ModelTier};
pub use conversation::Conversation;
pub use error::{CapabilityError, Error, Feature};
pub use orchestrator::{
    DEFAULT_MAX_TURNS, Orchestrator, OrchestratorBuilder, OrchestratorConfig,
    RunReport,
};
pub use tool::{Tool, ToolResult};
pub use turn::TurnExecutor;
