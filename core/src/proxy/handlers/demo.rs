//! Synthetic SSE stream for checking that streaming survives every hop
//! Handles GET /api/test

use std::convert::Infallible;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use serde_json::json;
use tokio::time::{sleep, Duration};

pub const DEMO_CHUNKS: usize = 5;
const DEMO_INTERVAL: Duration = Duration::from_millis(250);

pub async fn handle_test_stream() -> Response {
    let stream = async_stream::stream! {
        for i in 1..=DEMO_CHUNKS {
            let event = json!({
                "chunk": i,
                "message": format!("Chunk {} of {}", i, DEMO_CHUNKS),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            });
            yield Ok::<_, Infallible>(Bytes::from(format!("data: {}\n\n", event)));

            if i < DEMO_CHUNKS {
                sleep(DEMO_INTERVAL).await;
            }
        }
    };

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
    response
}
