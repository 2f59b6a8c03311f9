use tracing_subscriber::{fmt::time::UtcTime, prelude::*};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize stdout logging. Output is captured by whatever supervises the
/// process; there is no file-rotation layer.
///
/// If `logging.level` is set in config it takes precedence; otherwise the
/// `RUST_LOG` env var is used, falling back to `info`.
pub fn init_with_config(cfg: &LoggingConfig) {
    let env_filter = if let Some(level) = &cfg.level {
        tracing_subscriber::EnvFilter::new(level.as_str())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    match cfg.format {
        LogFormat::Json => {
            let _ = registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_timer(UtcTime::rfc_3339())
                        .with_writer(std::io::stdout),
                )
                .try_init();
        }
        LogFormat::Text => {
            let _ = registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(true)
                        .with_timer(UtcTime::rfc_3339())
                        .with_writer(std::io::stdout),
                )
                .try_init();
        }
    }
}
