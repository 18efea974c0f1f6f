//! An out-of-the-box tool-calling assistant for the DeepSeek API.
//!
//! The crate includes a CLI tool for asking questions in the terminal. And
//! you can also use it as a library: a [`Session`] wraps the orchestrator
//! with a system prompt and a toolset, so a question is one call away.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod session;
pub mod tools;

pub use session::{DEFAULT_MODEL, Session, SessionBuilder};

/// Re-exports of [`seekloop_core`] crate.
pub mod core {
    pub use seekloop_core::*;
}

/// Re-exports of [`seekloop_model`] crate.
pub mod model {
    pub use seekloop_model::*;
}

/// Re-exports of [`seekloop_deepseek`] crate.
pub mod deepseek {
    pub use seekloop_deepseek::*;
}
