//! The data model shared by every `seekloop` crate.
//!
//! This crate establishes a typed vocabulary for talking to a remote
//! chat-completion service that supports tool calls: the messages that
//! make up a conversation, the request snapshot sent on each turn, the
//! tool definitions the caller registers, and the response document the
//! service returns.
//!
//! Types in this crate don't define any orchestration behavior, instead
//! they are the constraints that transports and the orchestrator adhere
//! to. The [`Transport`] trait is the seam where a concrete network
//! client plugs in.

#![deny(missing_docs)]

mod error;
mod message;
mod request;
mod response;
mod tool;
mod transport;

pub use error::*;
pub use message::*;
pub use request::*;
pub use response::*;
pub use tool::*;
pub use transport::*;
