//! RAG Chat Core Library
//! Gateway relay, download proxy, token provider and category context for the chat client

pub mod auth;
pub mod category;
pub mod chat;
pub mod config;
pub mod proxy;
pub mod thread;
pub mod tool_result;
