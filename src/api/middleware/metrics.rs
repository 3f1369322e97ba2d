//! Per-request HTTP metrics

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::infrastructure::observability::record_http_request;

/// Route label for requests that matched no route
const UNMATCHED_ROUTE: &str = "unmatched";

/// Record count and latency of every request, keyed by the matched route
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = matched_route(&request);

    let response = next.run(request).await;

    record_http_request(
        method.as_str(),
        &route,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}

/// Route template rather than raw path, so probing random URLs cannot grow
/// the label set
fn matched_route(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_request_gets_fixed_label() {
        let request = Request::builder()
            .uri("/wp-admin/setup.php")
            .body(Body::empty())
            .unwrap();

        assert_eq!(matched_route(&request), UNMATCHED_ROUTE);
    }
}
