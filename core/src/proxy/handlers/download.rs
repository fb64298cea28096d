//! Download proxy handler
//! Handles GET /api/download/*path

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, Uri},
    response::Response,
};
use tracing::{error, info, warn};

use crate::proxy::context::ProxyRequestContext;
use crate::proxy::error::ProxyError;
use crate::proxy::path_guard::{validate_download_path, PathRejection, DOWNLOAD_PREFIX};
use crate::proxy::server::AppState;

/// The only upstream headers a download response may carry
const PASSTHROUGH_HEADERS: [HeaderName; 6] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_DISPOSITION,
    header::ETAG,
    header::LAST_MODIFIED,
    header::CACHE_CONTROL,
];

pub async fn handle_download(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ProxyError> {
    let trace_id = super::new_trace_id();

    // work on the raw path; the Path extractor would have decoded it already
    let raw_suffix = uri
        .path()
        .strip_prefix(DOWNLOAD_PREFIX)
        .ok_or_else(|| PathRejection::Traversal(uri.path().to_string()))?;

    if let Err(rejection) = validate_download_path(raw_suffix) {
        warn!("[{}] Rejected download path {:?}: {}", trace_id, raw_suffix, rejection);
        return Err(rejection.into());
    }

    let ctx = ProxyRequestContext::from_headers(&headers);
    info!(
        "[{}] Download | Path: {} | Correlation: {} | Conditional: {}",
        trace_id,
        raw_suffix,
        ctx.correlation_id_str(),
        ctx.if_none_match.is_some() || ctx.if_modified_since.is_some()
    );

    let upstream = state.upstream
        .get_download(&ctx, raw_suffix, uri.query())
        .await
        .inspect_err(|e| error!("[{}] Download failed for {}: {}", trace_id, raw_suffix, e))?;

    let status = upstream.status();
    info!("[{}] Download upstream responded {}", trace_id, status);

    let mut response = Response::builder().status(status);
    for name in &PASSTHROUGH_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            response = response.header(name.clone(), value.clone());
        }
    }

    Ok(response.body(Body::from_stream(upstream.bytes_stream()))?)
}
