//! Chat relay handler
//! Handles POST /api/copilotkit

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::Response,
};
use bytes::Bytes;
use tracing::{debug, error, info};

use crate::proxy::context::{redacted_headers, ProxyRequestContext};
use crate::proxy::error::ProxyError;
use crate::proxy::relay::relay_response;
use crate::proxy::server::AppState;

/// Forward a chat request to the agent and stream its answer back
pub async fn handle_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let trace_id = super::new_trace_id();
    let ctx = ProxyRequestContext::from_headers(&headers);

    debug!("[{}] Inbound headers: {:?}", trace_id, redacted_headers(&headers));
    info!(
        "[{}] Chat relay | Auth: {} | Correlation: {} | Body: {} bytes",
        trace_id,
        ctx.authorization.is_some(),
        ctx.correlation_id_str(),
        body.len()
    );

    let content_type = headers.get(header::CONTENT_TYPE).cloned();
    let response = state.upstream
        .post_agent(&ctx, content_type, body)
        .await
        .map_err(|e| {
            error!("[{}] Agent unreachable at {}: {}", trace_id, state.upstream.agent_url(), e);
            ProxyError::Upstream(e)
        })?;

    let status = response.status();
    if status.is_success() {
        info!("[{}] Agent responded {}", trace_id, status);
    } else {
        // relayed as-is, the backend's error body is the caller's to read
        info!("[{}] Agent responded {}, relaying error unchanged", trace_id, status);
    }

    relay_response(response, trace_id, state.log_stream_chunks)
}
