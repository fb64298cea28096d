//! Chat client - AG-UI run requests, streamed events, transcript

pub mod client;
pub mod conversation;
pub mod events;

pub use client::{ChatClient, EventStream};
pub use conversation::{Conversation, ToolCallSummary};
pub use events::{AgentEvent, Message, RunAgentInput};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("event stream broke: {0}")]
    Stream(String),

    #[error("undecodable event: {0}")]
    Decode(String),
}
