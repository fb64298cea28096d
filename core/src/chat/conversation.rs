//! Client-side conversation transcript

use serde_json::json;

use super::events::{AgentEvent, Message, RunAgentInput};
use crate::thread::ThreadContext;
use crate::tool_result::ToolResult;

/// A finished tool call as seen by the user
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallSummary {
    pub name: String,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    thread_id: String,
    messages: Vec<Message>,
    pending_text: String,
    pending_tools: Vec<(String, String)>,
    tool_calls: Vec<ToolCallSummary>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            thread_id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
            pending_text: String::new(),
            pending_tools: Vec::new(),
            tool_calls: Vec::new(),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn tool_calls(&self) -> &[ToolCallSummary] {
        &self.tool_calls
    }

    /// Append a user turn and build the run request carrying the current thread metadata
    pub fn user_turn(&mut self, text: &str, context: &ThreadContext) -> RunAgentInput {
        self.messages.push(Message::user(text));
        RunAgentInput {
            thread_id: self.thread_id.clone(),
            run_id: uuid::Uuid::new_v4().to_string(),
            state: json!({}),
            messages: self.messages.clone(),
            tools: Vec::new(),
            context: Vec::new(),
            forwarded_props: context.forwarded_props(),
        }
    }

    /// Fold a streamed event into the transcript. Returns a tool summary when a result lands.
    pub fn record(&mut self, event: &AgentEvent) -> Option<ToolCallSummary> {
        match event {
            AgentEvent::TextMessageContent { delta, .. } => {
                self.pending_text.push_str(delta);
                None
            }
            AgentEvent::TextMessageEnd { .. } | AgentEvent::RunFinished { .. } | AgentEvent::RunError { .. } => {
                self.flush_text();
                None
            }
            AgentEvent::ToolCallStart { tool_call_id, tool_call_name } => {
                self.pending_tools.push((tool_call_id.clone(), tool_call_name.clone()));
                None
            }
            AgentEvent::ToolCallResult { tool_call_id, content } => {
                let name = self
                    .pending_tools
                    .iter()
                    .position(|(id, _)| id == tool_call_id)
                    .map(|idx| self.pending_tools.remove(idx).1)
                    .unwrap_or_else(|| "tool".to_string());
                let summary = ToolCallSummary {
                    name,
                    summary: ToolResult::parse(content).summarize(),
                };
                self.tool_calls.push(summary.clone());
                Some(summary)
            }
            _ => None,
        }
    }

    fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            let text = std::mem::take(&mut self.pending_text);
            self.messages.push(Message::assistant(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::get_category_config;

    fn context() -> ThreadContext {
        ThreadContext::new(get_category_config(None, None))
    }

    #[test]
    fn user_turn_carries_history_and_metadata() {
        let mut conversation = Conversation::new();
        let first = conversation.user_turn("hello", &context());
        assert_eq!(first.messages.len(), 1);
        assert_eq!(first.thread_id, conversation.thread_id());
        assert_eq!(first.forwarded_props["threadMetadata"]["category"], "all");

        conversation.record(&AgentEvent::TextMessageContent { message_id: "m".into(), delta: "Hi ".into() });
        conversation.record(&AgentEvent::TextMessageContent { message_id: "m".into(), delta: "there".into() });
        conversation.record(&AgentEvent::TextMessageEnd { message_id: "m".into() });

        let second = conversation.user_turn("more", &context());
        let roles: Vec<&str> = second.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "user"]);
        assert_eq!(second.messages[1].content, "Hi there");
        assert_ne!(first.run_id, second.run_id);
    }

    #[test]
    fn tool_result_is_summarized_under_its_name() {
        let mut conversation = Conversation::new();
        conversation.record(&AgentEvent::ToolCallStart {
            tool_call_id: "t1".into(),
            tool_call_name: "perform_search".into(),
        });
        let summary = conversation
            .record(&AgentEvent::ToolCallResult {
                tool_call_id: "t1".into(),
                content: r#"{"query":"grip","category":"golf","documents":[{"id":"a"}]}"#.into(),
            })
            .unwrap();
        assert_eq!(summary.name, "perform_search");
        assert_eq!(summary.summary, "1 document for \"grip\" in golf");
        assert_eq!(conversation.tool_calls().len(), 1);
    }

    #[test]
    fn orphan_tool_result_still_renders() {
        let mut conversation = Conversation::new();
        let summary = conversation
            .record(&AgentEvent::ToolCallResult { tool_call_id: "x".into(), content: "null".into() })
            .unwrap();
        assert_eq!(summary.name, "tool");
        assert_eq!(summary.summary, "null");
    }

    #[test]
    fn run_error_flushes_partial_text() {
        let mut conversation = Conversation::new();
        conversation.record(&AgentEvent::TextMessageContent { message_id: "m".into(), delta: "partial".into() });
        conversation.record(&AgentEvent::RunError { message: "boom".into(), code: None });
        assert_eq!(conversation.messages().len(), 1);
        assert_eq!(conversation.messages()[0].content, "partial");
    }
}
