//! Streaming relay
//! Hands the backend's body to the caller chunk by chunk, optionally logging each chunk.

use std::fmt::Display;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::Stream;
use pin_project::{pin_project, pinned_drop};

use crate::proxy::error::ProxyError;

/// Connection-level headers; the server's own framing owns these
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Pass-through stream. Dropping it before the end drops the upstream body too,
/// which closes the backend connection.
#[pin_project(PinnedDrop)]
pub struct RelayStream<S> {
    #[pin]
    inner: S,
    trace_id: String,
    log_chunks: bool,
    chunks: usize,
    bytes: usize,
    finished: bool,
}

impl<S> RelayStream<S> {
    pub fn new(inner: S, trace_id: impl Into<String>, log_chunks: bool) -> Self {
        Self {
            inner,
            trace_id: trace_id.into(),
            log_chunks,
            chunks: 0,
            bytes: 0,
            finished: false,
        }
    }
}

impl<S, E> Stream for RelayStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                *this.chunks += 1;
                *this.bytes += chunk.len();
                if *this.log_chunks {
                    log_chunk(this.trace_id, *this.chunks, &chunk);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                tracing::warn!("[{}] Upstream stream error after {} chunk(s): {}", this.trace_id, this.chunks, e);
                *this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            None => {
                tracing::debug!("[{}] Stream complete | Chunks: {} | Bytes: {}", this.trace_id, this.chunks, this.bytes);
                *this.finished = true;
                Poll::Ready(None)
            }
        }
    }
}

#[pinned_drop]
impl<S> PinnedDrop for RelayStream<S> {
    fn drop(self: Pin<&mut Self>) {
        if !self.finished {
            tracing::debug!(
                "[{}] Client went away after {} chunk(s), cancelling upstream",
                self.trace_id,
                self.chunks
            );
        }
    }
}

fn log_chunk(trace_id: &str, index: usize, chunk: &Bytes) {
    match std::str::from_utf8(chunk) {
        Ok(text) => tracing::info!("[{}] Chunk #{}: {}", trace_id, index, text),
        Err(_) => tracing::info!("[{}] Chunk #{} (raw): {:?}", trace_id, index, chunk),
    }
}

/// Statuses and headers that guarantee there is nothing to stream
pub fn has_no_body(status: StatusCode, headers: &HeaderMap) -> bool {
    if status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        return true;
    }
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

/// Upstream headers minus hop-by-hop ones
pub fn end_to_end_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers
}

/// Mirror an upstream response: same status, same end-to-end headers, body relayed as it arrives
pub fn relay_response(upstream: reqwest::Response, trace_id: String, log_chunks: bool) -> Result<Response, ProxyError> {
    let status = upstream.status();
    let headers = end_to_end_headers(upstream.headers());

    let body = if has_no_body(status, upstream.headers()) {
        tracing::debug!("[{}] Upstream response has no body", trace_id);
        Body::empty()
    } else {
        Body::from_stream(RelayStream::new(upstream.bytes_stream(), trace_id, log_chunks))
    };

    let mut response = Response::builder().status(status).body(body)?;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use futures::{stream, StreamExt};

    #[tokio::test]
    async fn relays_every_chunk_in_order() {
        let chunks: Vec<Bytes> = (0..7)
            .map(|i| Bytes::from(format!("data: {{\"n\":{}}}\n\n", i)))
            .collect();
        let upstream = stream::iter(chunks.clone().into_iter().map(Ok::<_, std::io::Error>));

        let relayed: Vec<Bytes> = RelayStream::new(upstream, "t", true)
            .map(|r| r.unwrap())
            .collect()
            .await;

        assert_eq!(relayed, chunks);
    }

    #[tokio::test]
    async fn binary_chunks_pass_untouched() {
        let chunks = vec![Bytes::from_static(&[0xff, 0x00, 0xfe]), Bytes::from_static(b"ok")];
        let upstream = stream::iter(chunks.clone().into_iter().map(Ok::<_, std::io::Error>));

        let relayed: Vec<Bytes> = RelayStream::new(upstream, "t", true)
            .map(|r| r.unwrap())
            .collect()
            .await;

        assert_eq!(relayed, chunks);
    }

    #[tokio::test]
    async fn upstream_error_is_forwarded() {
        let upstream = stream::iter(vec![
            Ok(Bytes::from_static(b"first")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let items: Vec<_> = RelayStream::new(upstream, "t", false).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[test]
    fn no_body_detection() {
        let empty = HeaderMap::new();
        assert!(has_no_body(StatusCode::NO_CONTENT, &empty));
        assert!(has_no_body(StatusCode::NOT_MODIFIED, &empty));
        assert!(!has_no_body(StatusCode::OK, &empty));

        let mut zero = HeaderMap::new();
        zero.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
        assert!(has_no_body(StatusCode::OK, &zero));
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut upstream = HeaderMap::new();
        upstream.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        upstream.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        upstream.insert("x-backend-version", HeaderValue::from_static("7"));

        let headers = end_to_end_headers(&upstream);
        assert_eq!(headers.len(), 2);
        assert!(headers.get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(headers.get("x-backend-version").unwrap(), "7");
    }
}
