use crate::application::ports::{LogFormat, LoggingConfig};
use crate::domain::errors::{DomainError, DomainResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) -> DomainResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mematool_domain={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    let colors = config.enable_colors;

    let result = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_ansi(colors))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_ansi(colors))
            .try_init(),
        LogFormat::Full => registry.with(fmt::layer().with_ansi(colors)).try_init(),
    };

    result.map_err(|e| DomainError::Configuration {
        message: format!("Failed to install tracing subscriber: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::LogLevel;

    #[test]
    fn second_installation_is_reported() {
        let config = LoggingConfig {
            level: LogLevel::Debug,
            format: LogFormat::Compact,
            enable_colors: false,
        };

        // only the first installation in a process succeeds
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
