//! Conversation for a single question
//!
//! Append-only. Tracks which tool calls from the latest assistant turn are
//! still unanswered so the loop can never ask the model again while a call
//! is outstanding.

use crate::agent::types::Message;
use crate::error::{Error, Result};
use crate::tools::ToolCall;

/// The ordered messages exchanged while answering one question
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    /// Call ids from the latest assistant turn not yet answered, in order
    pending: Vec<String>,
}

impl Conversation {
    /// Start a conversation with the system prompt and the user's question
    pub fn new(system_prompt: impl Into<String>, question: impl Into<String>) -> Self {
        Conversation {
            messages: vec![Message::system(system_prompt), Message::user(question)],
            pending: Vec::new(),
        }
    }

    /// All messages so far
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; a conversation starts with two messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether any tool call from the last assistant turn is unanswered
    pub fn has_pending_calls(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Append the assistant turn that requested `calls`
    pub fn push_tool_calls(&mut self, content: impl Into<String>, calls: &[ToolCall]) -> Result<()> {
        if self.has_pending_calls() {
            return Err(Error::Internal(format!(
                "{} tool call(s) still unanswered",
                self.pending.len()
            )));
        }
        self.messages
            .push(Message::assistant_with_tool_calls(content, calls));
        self.pending = calls.iter().map(|c| c.id.clone()).collect();
        Ok(())
    }

    /// Append the result for one pending call.
    ///
    /// Results must arrive in the order the calls were emitted.
    pub fn push_tool_result(&mut self, call_id: &str, content: impl Into<String>) -> Result<()> {
        match self.pending.first() {
            Some(next) if next == call_id => {
                self.pending.remove(0);
                self.messages.push(Message::tool(call_id, content));
                Ok(())
            }
            Some(next) => Err(Error::Internal(format!(
                "tool result for '{}' arrived before '{}'",
                call_id, next
            ))),
            None => Err(Error::Internal(format!(
                "tool result for '{}' has no matching call",
                call_id
            ))),
        }
    }

    /// Consume the conversation, returning its messages
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::Role;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "tavily_search".into(),
            arguments: serde_json::json!({"query": "q"}),
        }
    }

    #[test]
    fn test_starts_with_system_and_user() {
        let conv = Conversation::new("be helpful", "What is the capital of France?");
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].role, Role::System);
        assert_eq!(conv.messages()[1].role, Role::User);
        assert!(!conv.has_pending_calls());
    }

    #[test]
    fn test_results_answer_calls_in_order() {
        let mut conv = Conversation::new("s", "q");
        conv.push_tool_calls("", &[call("a"), call("b")]).unwrap();
        assert!(conv.has_pending_calls());

        assert!(conv.push_tool_result("b", "early").is_err());
        conv.push_tool_result("a", "first").unwrap();
        conv.push_tool_result("b", "second").unwrap();
        assert!(!conv.has_pending_calls());

        let msgs = conv.into_messages();
        assert_eq!(msgs.len(), 5);
        assert_eq!(msgs[3].tool_call_id.as_deref(), Some("a"));
        assert_eq!(msgs[4].tool_call_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_unknown_call_id_rejected() {
        let mut conv = Conversation::new("s", "q");
        assert!(conv.push_tool_result("ghost", "x").is_err());
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_new_turn_blocked_while_calls_pending() {
        let mut conv = Conversation::new("s", "q");
        conv.push_tool_calls("", &[call("a")]).unwrap();
        assert!(conv.push_tool_calls("", &[call("b")]).is_err());
    }
}
