//! Per-request forwarding context
//! The few inbound headers that are allowed to travel to the backend.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Default)]
pub struct ProxyRequestContext {
    pub authorization: Option<HeaderValue>,
    pub correlation_id: Option<HeaderValue>,
    pub if_none_match: Option<HeaderValue>,
    pub if_modified_since: Option<HeaderValue>,
}

impl ProxyRequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let correlation_id = headers
            .get(CORRELATION_ID_HEADER)
            .or_else(|| headers.get(REQUEST_ID_HEADER))
            .cloned();

        Self {
            authorization: headers.get(header::AUTHORIZATION).cloned(),
            correlation_id,
            if_none_match: headers.get(header::IF_NONE_MATCH).cloned(),
            if_modified_since: headers.get(header::IF_MODIFIED_SINCE).cloned(),
        }
    }

    /// Authorization and correlation id, whichever are present
    pub fn identity_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(auth) = &self.authorization {
            headers.insert(header::AUTHORIZATION, auth.clone());
        }
        if let Some(id) = &self.correlation_id {
            headers.insert(HeaderName::from_static(CORRELATION_ID_HEADER), id.clone());
        }
        headers
    }

    /// Identity headers plus conditional-GET validators
    pub fn conditional_headers(&self) -> HeaderMap {
        let mut headers = self.identity_headers();
        if let Some(etag) = &self.if_none_match {
            headers.insert(header::IF_NONE_MATCH, etag.clone());
        }
        if let Some(since) = &self.if_modified_since {
            headers.insert(header::IF_MODIFIED_SINCE, since.clone());
        }
        headers
    }

    pub fn correlation_id_str(&self) -> &str {
        self.correlation_id
            .as_ref()
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
    }
}

/// Header dump for debug logs with credentials masked
pub fn redacted_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if name == header::AUTHORIZATION || name == header::COOKIE {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(HeaderName::from_static(k), HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn correlation_id_prefers_explicit_header() {
        let ctx = ProxyRequestContext::from_headers(&headers(&[
            ("x-request-id", "req-1"),
            ("x-correlation-id", "corr-1"),
        ]));
        assert_eq!(ctx.correlation_id_str(), "corr-1");

        let ctx = ProxyRequestContext::from_headers(&headers(&[("x-request-id", "req-1")]));
        assert_eq!(ctx.correlation_id_str(), "req-1");
        let out = ctx.identity_headers();
        assert_eq!(out.get(CORRELATION_ID_HEADER).unwrap(), "req-1");
        assert!(out.get(REQUEST_ID_HEADER).is_none());
    }

    #[test]
    fn absent_headers_are_not_invented() {
        let ctx = ProxyRequestContext::from_headers(&HeaderMap::new());
        assert!(ctx.identity_headers().is_empty());
        assert!(ctx.conditional_headers().is_empty());
        assert_eq!(ctx.correlation_id_str(), "-");
    }

    #[test]
    fn conditional_headers_are_carried() {
        let ctx = ProxyRequestContext::from_headers(&headers(&[
            ("authorization", "Bearer abc"),
            ("if-none-match", "\"v1\""),
            ("if-modified-since", "Wed, 21 Oct 2015 07:28:00 GMT"),
            ("cookie", "session=1"),
        ]));
        let out = ctx.conditional_headers();
        assert_eq!(out.len(), 3);
        assert_eq!(out.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
        assert!(out.get(header::COOKIE).is_none());
        // chat relay does not send validators
        assert_eq!(ctx.identity_headers().len(), 1);
    }

    #[test]
    fn redaction_masks_credentials_only() {
        let dump = redacted_headers(&headers(&[
            ("authorization", "Bearer secret"),
            ("cookie", "a=b"),
            ("accept", "text/event-stream"),
        ]));
        for (name, value) in dump {
            match name.as_str() {
                "authorization" | "cookie" => assert_eq!(value, REDACTED),
                _ => assert_eq!(value, "text/event-stream"),
            }
        }
    }
}
