//! Upstream client for calling the agent backend

use axum::http::HeaderValue;
use bytes::Bytes;
use reqwest::{header, Client, Response};
use tokio::time::Duration;

use crate::config::Config;
use crate::proxy::context::ProxyRequestContext;
use crate::proxy::error::ProxyError;

const DOWNLOAD_PATH: &str = "download";

#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
    agent_url: String,
    request_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        // no overall timeout here: chat responses stream for as long as the agent runs
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_timeout))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!("ragchat-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.backend.base_url.trim_end_matches('/').to_string(),
            agent_url: config.backend.agent_url(),
            request_timeout: Duration::from_secs(config.timeouts.request_timeout),
        })
    }

    pub fn agent_url(&self) -> &str {
        &self.agent_url
    }

    /// Headers for an agent run: forwarded identity, SSE accept, caller's content type
    pub fn agent_headers(ctx: &ProxyRequestContext, content_type: Option<HeaderValue>) -> header::HeaderMap {
        let mut headers = ctx.identity_headers();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(
            header::CONTENT_TYPE,
            content_type.unwrap_or_else(|| HeaderValue::from_static("application/json")),
        );
        headers
    }

    /// Backend URL mirroring a download suffix and query string
    pub fn download_url(&self, raw_suffix: &str, query: Option<&str>) -> String {
        let mut url = format!("{}/{}/{}", self.base_url, DOWNLOAD_PATH, raw_suffix.trim_start_matches('/'));
        if let Some(qs) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(qs);
        }
        url
    }

    /// Forward a chat request body to the agent endpoint
    pub async fn post_agent(
        &self,
        ctx: &ProxyRequestContext,
        content_type: Option<HeaderValue>,
        body: Bytes,
    ) -> Result<Response, reqwest::Error> {
        self.http_client
            .post(&self.agent_url)
            .headers(Self::agent_headers(ctx, content_type))
            .body(body)
            .send()
            .await
    }

    /// Forward a download. No retry: the caller can simply ask again.
    ///
    /// The request timeout bounds the wait for response headers only; the body then
    /// streams for as long as it takes.
    pub async fn get_download(
        &self,
        ctx: &ProxyRequestContext,
        raw_suffix: &str,
        query: Option<&str>,
    ) -> Result<Response, ProxyError> {
        let request = self.http_client
            .get(self.download_url(raw_suffix, query))
            .headers(ctx.conditional_headers())
            .send();

        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(response) => Ok(response?),
            Err(_) => Err(ProxyError::UpstreamTimeout(self.request_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    fn client(base: &str) -> UpstreamClient {
        let mut config = Config::default();
        config.backend.base_url = base.to_string();
        UpstreamClient::new(&config).unwrap()
    }

    #[test]
    fn download_url_keeps_path_and_query() {
        let client = client("http://backend:8000/");
        assert_eq!(
            client.download_url("container/report%20v2.pdf", Some("v=3&page=2")),
            "http://backend:8000/download/container/report%20v2.pdf?v=3&page=2"
        );
        assert_eq!(
            client.download_url("container/a.pdf", Some("")),
            "http://backend:8000/download/container/a.pdf"
        );
        assert_eq!(client.agent_url(), "http://backend:8000/");
    }

    #[test]
    fn agent_headers_always_ask_for_sse() {
        let headers = UpstreamClient::agent_headers(&ProxyRequestContext::default(), None);
        assert_eq!(headers.get(header::ACCEPT).unwrap(), "text/event-stream");
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert!(headers.get(header::AUTHORIZATION).is_none());

        let mut inbound = HeaderMap::new();
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        inbound.insert("x-request-id", HeaderValue::from_static("r-9"));
        let ctx = ProxyRequestContext::from_headers(&inbound);
        let headers = UpstreamClient::agent_headers(&ctx, Some(HeaderValue::from_static("application/json; charset=utf-8")));
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer t");
        assert_eq!(headers.get("x-correlation-id").unwrap(), "r-9");
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json; charset=utf-8");
    }
}
