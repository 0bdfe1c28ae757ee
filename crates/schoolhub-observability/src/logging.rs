use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{RandomIdGenerator, Sampler, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::basic_logging::init_basic_console_logging;
use crate::metrics::is_observability_enabled;

const LOG_DIR: &str = "storage/logs";

/// Logs one line per request with the matched route, status and latency.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let request_id = uuid::Uuid::new_v4();

    let response = next.run(req).await;
    let status = response.status().as_u16();
    let latency_ms = start.elapsed().as_millis() as u64;

    match status {
        500..=599 => error!(%request_id, %method, %path, status, latency_ms, "Server error"),
        400..=499 => warn!(%request_id, %method, %path, status, latency_ms, "Client error"),
        _ => info!(%request_id, %method, %path, status, latency_ms, "Request completed"),
    }

    response
}

fn init_tracer(endpoint: &str) -> anyhow::Result<Tracer> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, "schoolhub"),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(
            "environment",
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        ),
    ]);

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)?;

    Ok(tracer)
}

/// Installs the global subscriber.
///
/// Layers: compact console output, a daily `schoolhub.log` holding errors,
/// a daily `schoolhub.json` for log shippers, and an OTLP exporter when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set. Must run inside a Tokio runtime.
pub fn init_tracing() -> anyhow::Result<()> {
    if !is_observability_enabled() {
        return init_basic_console_logging();
    }

    std::fs::create_dir_all(LOG_DIR)?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("schoolhub=info,schoolhub_cli=info,tower_http=warn,sqlx=warn")
    });
    let console_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(console_filter);

    let error_layer = fmt::layer()
        .with_writer(RollingFileAppender::new(
            Rotation::DAILY,
            LOG_DIR,
            "schoolhub.log",
        ))
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(EnvFilter::new("error"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(RollingFileAppender::new(
            Rotation::DAILY,
            LOG_DIR,
            "schoolhub.json",
        ))
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    let registry = tracing_subscriber::registry()
        .with(console_layer)
        .with(error_layer)
        .with(json_layer);

    match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) if !endpoint.is_empty() => match init_tracer(&endpoint) {
            Ok(tracer) => {
                registry
                    .with(tracing_opentelemetry::layer().with_tracer(tracer))
                    .try_init()?;
                info!(otel.endpoint = %endpoint, "Tracing initialized with OpenTelemetry");
            }
            Err(e) => {
                registry.try_init()?;
                warn!(error = %e, "OpenTelemetry unavailable, logging locally only");
            }
        },
        _ => {
            registry.try_init()?;
            info!("Tracing initialized");
        }
    }

    Ok(())
}

/// Flushes pending spans.
pub async fn shutdown_tracer() {
    global::shutdown_tracer_provider();
    info!("Tracer shut down");
}
