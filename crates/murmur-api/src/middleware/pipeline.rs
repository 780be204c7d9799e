//! # Request Pipeline
//!
//! Outermost middleware. For every request, in order:
//!
//! 1. Assign a request id and log the arrival.
//! 2. Answer `OPTIONS` probes with an empty `200` and stop.
//! 3. Insert a [`RequestContext`] carrying the id and the deadline.
//! 4. Run the rest of the stack under the deadline. If it elapses, the
//!    inner future is dropped and the request fails with a 500.
//! 5. Log any failure exactly once through [`ErrorResponder`].
//! 6. Stamp `X-Request-ID`, the CORS headers, and a JSON content type
//!    where the handler set none.
//! 7. Log completion with status and latency.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::context::{RequestContext, RequestId, REQUEST_ID_HEADER};
use crate::error::{AppError, ErrorResponder};
use crate::state::AppState;

pub async fn pipeline(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = RequestId::new();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    tracing::info!(request_id = %request_id, %method, %path, "request received");

    let mut response = if method == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        let timeout = state.config.request_timeout;
        request
            .extensions_mut()
            .insert(RequestContext::new(request_id.clone(), timeout));

        match tokio::time::timeout(timeout, next.run(request)).await {
            Ok(response) => ErrorResponder::finish(&request_id, response),
            Err(_) => ErrorResponder::respond(
                &request_id,
                AppError::Internal("request deadline exceeded".into()),
            ),
        }
    };

    stamp_headers(
        response.headers_mut(),
        &request_id,
        &state.config.allowed_origin,
    );

    tracing::info!(
        request_id = %request_id,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}

fn stamp_headers(headers: &mut HeaderMap, request_id: &RequestId, allowed_origin: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    if let Ok(value) = HeaderValue::from_str(allowed_origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Authorization"),
    );
    headers
        .entry(header::CONTENT_TYPE)
        .or_insert(HeaderValue::from_static("application/json"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamps_cors_and_request_id() {
        let mut headers = HeaderMap::new();
        let id = RequestId::new();
        stamp_headers(&mut headers, &id, "https://feed.example");

        assert_eq!(headers[REQUEST_ID_HEADER], id.as_str());
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://feed.example"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Authorization");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn keeps_handler_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        stamp_headers(&mut headers, &RequestId::new(), "*");
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn unrepresentable_origin_is_skipped() {
        let mut headers = HeaderMap::new();
        stamp_headers(&mut headers, &RequestId::new(), "bad\nvalue");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert!(headers.get(REQUEST_ID_HEADER).is_some());
    }
}
