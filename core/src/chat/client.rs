//! HTTP client for agent runs and downloads through the gateway

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use reqwest::header;
use std::pin::Pin;
use std::time::Duration;

use super::events::{AgentEvent, RunAgentInput};
use super::ChatError;
use crate::proxy::context::CORRELATION_ID_HEADER;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent, ChatError>> + Send>>;

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// `base_url` is the gateway root, e.g. `http://127.0.0.1:3000`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .user_agent(concat!("ragchat-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/copilotkit", self.base_url)
    }

    pub fn download_url(&self, path: &str) -> String {
        format!("{}/api/download/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start an agent run and stream its events
    pub async fn run(&self, input: &RunAgentInput, token: Option<&str>) -> Result<EventStream, ChatError> {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("Agent run {} (correlation {})", input.run_id, correlation_id);

        let mut request = self.http
            .post(self.chat_url())
            .header(header::ACCEPT, "text/event-stream")
            .header(CORRELATION_ID_HEADER, correlation_id)
            .json(input);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status: status.as_u16(), body });
        }

        let events = response
            .bytes_stream()
            .eventsource()
            .filter_map(|item| async move {
                match item {
                    Ok(event) if event.data.trim().is_empty() => None,
                    Ok(event) => Some(
                        serde_json::from_str::<AgentEvent>(&event.data)
                            .map_err(|e| ChatError::Decode(format!("{}: {}", e, event.data))),
                    ),
                    Err(e) => Some(Err(ChatError::Stream(e.to_string()))),
                }
            });

        Ok(Box::pin(events))
    }

    /// GET a source document; the caller consumes the body
    pub async fn download(&self, path: &str, token: Option<&str>) -> Result<reqwest::Response, ChatError> {
        let mut request = self.http
            .get(self.download_url(path))
            .header(CORRELATION_ID_HEADER, uuid::Uuid::new_v4().to_string());
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status { status: status.as_u16(), body });
        }
        Ok(response)
    }
}
