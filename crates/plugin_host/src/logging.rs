use crate::config::LoggingSettings;
use crate::error::HostError;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Command line
/// overrides are expected to be folded into `config` beforehand.
///
/// # Returns
///
/// [`HostError::Logging`] if a global subscriber is already installed.
pub fn setup_logging(config: &LoggingSettings) -> Result<(), HostError> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_target(true),
            )
            .try_init()
    };
    result.map_err(|e| HostError::Logging(e.to_string()))?;

    info!("Logging initialized with level: {}", log_level);
    Ok(())
}
