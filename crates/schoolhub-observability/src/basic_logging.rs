use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Console-only logging, used when observability is compiled out or disabled.
///
/// `RUST_LOG` wins when set; otherwise `LOG_LEVEL` (default `info`) applies
/// to the application and noisy dependencies are held at `warn`.
pub fn init_basic_console_logging() -> anyhow::Result<()> {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "schoolhub={level},schoolhub_cli={level},tower_http=warn,hyper=warn,sqlx=warn",
            level = log_level
        ))
    });

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .try_init()?;

    eprintln!("Observability disabled, logging to console only");
    Ok(())
}
