//! Conversation buffer for one orchestration run
//!
//! Holds the ordered message history sent to the model each round. The
//! buffer is append-only; it enforces that every tool call of an assistant
//! message is answered by exactly one tool message before the next
//! assistant reply.

use crate::llm::{Message, MessageRole};

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with the policy message and the caller's text
    pub fn seeded(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Check the call/reply pairing across the whole history
    pub fn is_well_formed(&self) -> bool {
        let mut pending: Vec<&str> = Vec::new();

        for message in &self.messages {
            match message.role {
                MessageRole::Assistant => {
                    if !pending.is_empty() {
                        return false;
                    }
                    pending = message.tool_calls.iter().map(|c| c.id.as_str()).collect();
                }
                MessageRole::Tool => {
                    let Some(id) = message.tool_call_id.as_deref() else {
                        return false;
                    };
                    match pending.iter().position(|p| *p == id) {
                        Some(index) => {
                            pending.remove(index);
                        }
                        None => return false,
                    }
                }
                MessageRole::System | MessageRole::User => {}
            }
        }

        pending.is_empty()
    }
}
