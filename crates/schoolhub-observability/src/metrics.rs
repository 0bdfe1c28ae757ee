use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

pub use metrics_exporter_prometheus::PrometheusHandle;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Reads `OBSERVABILITY_ENABLED` once; anything but `false`/`0` enables it.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(true)
    })
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "false" | "0" | "off" | "no")
}

/// Installs the Prometheus recorder and its upkeep task.
///
/// Returns `None` when observability is disabled at runtime.
pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    gauge!("http_requests_active").increment(1.0);
    let response = next.run(req).await;
    gauge!("http_requests_active").decrement(1.0);

    let status = response.status().as_u16().to_string();
    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}

/// Router served on the metrics port.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_school_created() {
    if is_observability_enabled() {
        counter!("schools_created_total").increment(1);
    }
}

pub fn track_class_created(class_type: &str) {
    if is_observability_enabled() {
        counter!("classes_created_total", "class_type" => class_type.to_string()).increment(1);
    }
}

pub fn track_academic_structure_generated(classes: usize, modules: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("academic_structures_generated_total").increment(1);
    counter!("classes_created_total", "class_type" => "school_class").increment(classes as u64);
    counter!("course_modules_created_total").increment(modules as u64);
}

/// `source` is `bulk` or `code`.
pub fn track_join_requests_created(source: &'static str, count: usize) {
    if is_observability_enabled() {
        counter!("join_requests_created_total", "source" => source).increment(count as u64);
    }
}

pub fn track_invitation_codes_generated() {
    if is_observability_enabled() {
        counter!("invitation_codes_generated_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" FALSE "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }

    #[test]
    fn test_business_counters_without_recorder_are_noops() {
        track_school_created();
        track_class_created("public");
        track_academic_structure_generated(3, 18);
        track_join_requests_created("bulk", 2);
        track_invitation_codes_generated();
    }
}
