use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    http::{HeaderName, Response},
    middleware::{self, Next},
};
use opentelemetry::KeyValue;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{MakeSpan, OnResponse, TraceLayer},
};
use tracing::Span;

use super::metrics::{HTTP_REQUEST_DURATION, HTTP_REQUESTS_TOTAL};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Label used for requests that matched no route, keeping metric cardinality bounded.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Wraps the relay routes with request ids, a request span and HTTP metrics.
///
/// Must be applied to the router returned by `routes::create_router` so that
/// `MatchedPath` is already set when the span and metrics read it.
pub fn instrument_router(router: Router) -> Router {
    let request_id = HeaderName::from_static(X_REQUEST_ID);

    router
        .layer(middleware::from_fn(record_http_metrics))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(RelayMakeSpan)
                .on_response(RelayOnResponse),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

/// Route template such as `/analyze-minutes`, falling back to the raw path.
pub(crate) fn route_of<B>(request: &Request<B>) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or_else(|| request.uri().path())
}

pub(crate) fn status_class(status: u16) -> &'static str {
    match status / 100 {
        1 => "1xx",
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        _ => "5xx",
    }
}

#[derive(Clone)]
pub struct RelayMakeSpan;

impl<B> MakeSpan<B> for RelayMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method().as_str();
        let route = route_of(request);
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "HTTP request",
            otel.name = %format!("{method} {route}"),
            otel.kind = "server",
            http.request.method = %method,
            http.route = %route,
            url.path = %request.uri().path(),
            request_id = %request_id,
            http.response.status_code = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
        )
    }
}

#[derive(Clone)]
pub struct RelayOnResponse;

impl<B> OnResponse<B> for RelayOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status();

        span.record("http.response.status_code", status.as_u16() as i64);
        span.record(
            "otel.status_code",
            if status.is_server_error() { "ERROR" } else { "OK" },
        );

        tracing::info!(
            http.response.status_code = status.as_u16(),
            latency_ms = latency.as_secs_f64() * 1000.0,
            "finished processing request"
        );
    }
}

async fn record_http_metrics(request: Request, next: Next) -> axum::response::Response {
    let method = request.method().to_string();
    let route = match request.extensions().get::<MatchedPath>() {
        Some(path) => path.as_str().to_string(),
        None => UNMATCHED_ROUTE.to_string(),
    };
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let attributes = [
        KeyValue::new("http.request.method", method),
        KeyValue::new("http.route", route),
        KeyValue::new("http.status_code", status.to_string()),
        KeyValue::new("http.status_class", status_class(status)),
    ];
    HTTP_REQUESTS_TOTAL.add(1, &attributes);
    HTTP_REQUEST_DURATION.record(started.elapsed().as_secs_f64() * 1000.0, &attributes);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::HeaderValue, routing::get};
    use tower::ServiceExt;

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(200), "2xx");
        assert_eq!(status_class(404), "4xx");
        assert_eq!(status_class(422), "4xx");
        assert_eq!(status_class(503), "5xx");
    }

    #[test]
    fn test_route_of_without_match_uses_path() {
        let request = Request::builder()
            .uri("/nowhere?x=1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(route_of(&request), "/nowhere");
    }

    #[tokio::test]
    async fn test_route_of_reads_matched_template() {
        let app = Router::new()
            .route("/items/{id}", get(|| async { "ok" }))
            .layer(middleware::from_fn(|request: Request, next: Next| async move {
                let route = HeaderValue::from_str(route_of(&request)).unwrap();
                let mut response = next.run(request).await;
                response.headers_mut().insert("x-route", route);
                response
            }));

        let response = app
            .oneshot(Request::builder().uri("/items/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()["x-route"], "/items/{id}");
    }

    #[tokio::test]
    async fn test_instrumented_router_sets_request_id() {
        let app = instrument_router(Router::new().route("/ping", get(|| async { "pong" })));

        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let id = response.headers()[X_REQUEST_ID].to_str().unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn test_instrumented_router_keeps_caller_request_id() {
        let app = instrument_router(Router::new().route("/ping", get(|| async { "pong" })));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header(X_REQUEST_ID, "caller-id-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[X_REQUEST_ID], "caller-id-1");
    }
}
