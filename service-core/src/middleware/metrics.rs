use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use std::time::Instant;

/// Probe and scrape endpoints are polled constantly; counting them would
/// drown the request metrics in noise.
const EXCLUDED_PATHS: [&str; 3] = ["/health", "/ready", "/metrics"];

/// Record request count and latency, labelled by method, path, and status.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    if EXCLUDED_PATHS.contains(&path.as_str()) {
        return response;
    }

    let duration = start.elapsed();
    let status = response.status().as_u16().to_string();

    let labels = [("method", method), ("path", path), ("status", status)];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    response
}
