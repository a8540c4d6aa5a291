//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the Prometheus recorder (once per process)
//! - Record request count and latency when a response completes
//! - Normalize URL labels back to route templates
//!
//! # Metrics
//! - `chartgateway_requests_total` (counter): requests by code, method, url
//! - `chartgateway_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - The `url` label has matched parameter values replaced by `:name`
//! - Matched params reach the hook through response extensions

use std::ops::Range;
use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::routing::Params;

static PROMETHEUS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Parameters bound by the matcher, attached to the response for the metrics hook.
#[derive(Debug, Clone)]
pub struct MatchedParams(pub Params);

/// Install the global Prometheus recorder and return a handle for rendering.
///
/// Returns `None` if another recorder was installed first.
pub fn install_recorder() -> Option<PrometheusHandle> {
    PROMETHEUS
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                tracing::info!("Prometheus recorder installed");
                Some(handle)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install metrics recorder");
                None
            }
        })
        .clone()
}

/// Completion hook: records one sample per finished request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let url = request.uri().to_string();

    let response = next.run(request).await;

    let label = match response.extensions().get::<MatchedParams>() {
        Some(MatchedParams(params)) => normalize_url(&url, params),
        None => url,
    };
    record_request(&method, response.status().as_u16(), label, start);
    response
}

pub fn record_request(method: &str, status: u16, url: String, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    let code = status.to_string();
    metrics::counter!(
        "chartgateway_requests_total",
        "code" => code.clone(),
        "method" => method.to_string(),
        "url" => url.clone()
    )
    .increment(1);
    metrics::histogram!(
        "chartgateway_request_duration_seconds",
        "code" => code,
        "method" => method.to_string(),
        "url" => url
    )
    .record(elapsed);
}

/// Replace each bound parameter value in `url` with `:name`.
///
/// Bindings produced by the matcher carry their segment positions and are substituted in
/// place, so a value that equals a route literal or another value cannot corrupt the label.
/// Bindings without positions fall back to replacing the first whole-segment occurrence of the
/// value, longest value first.
pub fn normalize_url(url: &str, params: &Params) -> String {
    let (path, tail) = url.split_at(url.find(['?', '#']).unwrap_or(url.len()));
    let segments = segment_ranges(path);

    let mut positioned: Vec<(&str, Range<usize>)> = params
        .spans()
        .filter(|(_, span)| !span.is_empty())
        .filter_map(|(name, span)| {
            let start = segments.get(span.start)?.start;
            let end = segments.get(span.end - 1)?.end;
            Some((name, start..end))
        })
        .collect();
    if positioned.is_empty() {
        return normalize_by_value(url, params);
    }

    positioned.sort_by(|a, b| b.1.start.cmp(&a.1.start));
    let mut normalized = path.to_string();
    for (name, range) in positioned {
        normalized.replace_range(range, &format!(":{name}"));
    }
    normalized.push_str(tail);
    normalized
}

/// Byte ranges of the `/`-separated segments of `path`, leading and trailing slashes ignored.
fn segment_ranges(path: &str) -> Vec<Range<usize>> {
    let start = path.len() - path.trim_start_matches('/').len();
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut offset = start;
    trimmed
        .split('/')
        .map(|segment| {
            let range = offset..offset + segment.len();
            offset = range.end + 1;
            range
        })
        .collect()
}

fn normalize_by_value(url: &str, params: &Params) -> String {
    let mut bindings: Vec<(&str, &str)> = params.iter().filter(|(_, value)| !value.is_empty()).collect();
    bindings.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    let mut normalized = url.to_string();
    for (name, value) in bindings {
        if let Some(start) = find_segment(&normalized, value) {
            normalized.replace_range(start..start + value.len(), &format!(":{name}"));
        }
    }
    normalized
}

/// Byte offset of the first occurrence of `value` bounded by `/` and a segment end.
fn find_segment(url: &str, value: &str) -> Option<usize> {
    let path = &url[..url.find(['?', '#']).unwrap_or(url.len())];
    let bytes = path.as_bytes();
    path.match_indices(value).map(|(i, _)| i).find(|&i| {
        let end = i + value.len();
        i > 0 && bytes[i - 1] == b'/' && (end == bytes.len() || bytes[end] == b'/')
    })
}
