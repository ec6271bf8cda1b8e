//! Structured logging setup using tracing
//!
//! Console output goes to stderr so that result documents printed on stdout
//! stay machine-readable. File output is JSON with rotation.

use crate::config::LoggingConfig;
use crate::domain::{InkguardError, Result};
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// File name prefix for rotated log files
const LOG_FILE_NAME: &str = "inkguard.log";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Keeps the non-blocking file writer alive; logs are flushed when dropped
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the logging system based on configuration
///
/// `RUST_LOG` takes precedence over `log_level_str` when set.
///
/// # Errors
///
/// Returns an error for an unknown log level or when the log directory
/// cannot be created.
///
/// # Example
///
/// ```no_run
/// use inkguard::logging::init_logging;
/// use inkguard::config::LoggingConfig;
///
/// let config = LoggingConfig::default();
/// let _guard = init_logging("info", &config).expect("Failed to initialize logging");
/// // Keep _guard alive for the duration of the program
/// ```
pub fn init_logging(log_level_str: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(log_level_str)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("inkguard={level}")));

    let mut layers = vec![console_layer(filter.clone())];
    let mut file_guard = None;

    if config.local_enabled {
        let (layer, guard) = file_layer(config, filter)?;
        layers.push(layer);
        file_guard = Some(guard);
    }

    tracing_subscriber::registry().with(layers).init();

    tracing::debug!(
        local_enabled = config.local_enabled,
        local_path = %config.local_path,
        rotation = %config.local_rotation,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn console_layer<S>(filter: EnvFilter) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .with_filter(filter)
        .boxed()
}

/// JSON lines into `<local_path>/inkguard.log[.<period>]`
fn file_layer<S>(config: &LoggingConfig, filter: EnvFilter) -> Result<(BoxedLayer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        InkguardError::Configuration(format!(
            "Failed to create log directory {}: {e}",
            config.local_path
        ))
    })?;

    let appender = RollingFileAppender::new(
        rotation_for(&config.local_rotation),
        &config.local_path,
        LOG_FILE_NAME,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
        .with_filter(filter)
        .boxed();

    Ok((layer, guard))
}

fn rotation_for(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

/// Parse log level from string
///
/// # Errors
///
/// Returns a configuration error for anything other than the five tracing
/// levels (case-insensitive).
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    level_str.trim().parse::<Level>().map_err(|_| {
        InkguardError::Configuration(format!(
            "Invalid log level: {level_str}. Must be one of: trace, debug, info, warn, error"
        ))
    })
}
