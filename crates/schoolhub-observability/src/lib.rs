//! # SchoolHub Observability
//!
//! - console, rolling file and JSON logs through `tracing-subscriber`
//! - OpenTelemetry export when `OTEL_EXPORTER_OTLP_ENDPOINT` is set
//! - Prometheus metrics for HTTP traffic and school/class business events
//!
//! Everything beyond console logging sits behind the `observability`
//! feature. With the feature compiled in, `OBSERVABILITY_ENABLED=false`
//! switches it off at runtime. With the feature off, the same function
//! names resolve to no-op stubs so callers never need `cfg` attributes.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! schoolhub_observability::init_tracing()?;
//! // ... serve ...
//! schoolhub_observability::shutdown_tracer().await;
//! # Ok(())
//! # }
//! ```

pub mod basic_logging;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, logging_middleware, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    PrometheusHandle, init_metrics, is_observability_enabled, metrics_app, metrics_middleware,
    track_academic_structure_generated, track_class_created, track_invitation_codes_generated,
    track_join_requests_created, track_school_created,
};

#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{Router, extract::Request, middleware::Next, response::Response};

    /// Placeholder for the Prometheus handle; never constructed.
    #[derive(Clone, Debug)]
    pub struct PrometheusHandle;

    pub fn is_observability_enabled() -> bool {
        false
    }

    pub fn init_tracing() -> anyhow::Result<()> {
        crate::basic_logging::init_basic_console_logging()
    }

    pub async fn shutdown_tracer() {}

    pub async fn logging_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
        Ok(None)
    }

    pub fn metrics_app(_handle: PrometheusHandle) -> Router {
        Router::new()
    }

    pub fn track_school_created() {}
    pub fn track_class_created(_class_type: &str) {}
    pub fn track_academic_structure_generated(_classes: usize, _modules: usize) {}
    pub fn track_join_requests_created(_source: &'static str, _count: usize) {}
    pub fn track_invitation_codes_generated() {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
