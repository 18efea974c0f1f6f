//! Conversation-related types.

use seekloop_model::{ChatRequest, Message, ResponseMessage, Role};

/// The message history of one orchestration run.
///
/// Messages are only ever appended. Their order is the turn history that
/// is sent back to the model on every turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates a conversation seeded with the given messages.
    #[inline]
    pub fn seeded(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Appends a message.
    #[inline]
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns the messages in insertion order.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the conversation has no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consumes the conversation and returns its messages.
    #[inline]
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Builds the snapshot for the next turn.
    ///
    /// Everything except the messages comes from `initial`, so sampling
    /// parameters, tools and controls stay the same for the whole run.
    pub(crate) fn next_request(&self, initial: &ChatRequest) -> ChatRequest {
        ChatRequest {
            messages: self.messages.clone(),
            ..initial.clone()
        }
    }
}

/// Converts a message generated by the model into a history message.
///
/// The reasoning trace is dropped, it is for display only and must not be
/// replayed to the model. Tool calls are kept so that the following tool
/// messages answer ids the service has seen.
pub fn history_message(message: &ResponseMessage) -> Message {
    Message {
        role: Role::Assistant,
        content: message.content.clone(),
        name: None,
        tool_call_id: None,
        tool_calls: message
            .tool_calls
            .clone()
            .filter(|calls| !calls.is_empty()),
    }
}
