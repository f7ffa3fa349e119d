//! Logging infrastructure with optional rolling file output.

use crate::infrastructure::config::LoggingConfig;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize logging with console and optional file output.
///
/// `RUST_LOG` takes precedence over the configured level. When file output is
/// enabled, logs rotate daily under `log_dir` as `claw-keepalive.log.YYYY-MM-DD`.
pub fn setup(config: &LoggingConfig, log_dir: &Path) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    // Console layer (always enabled)
    let console_layer = fmt::layer().with_target(true).with_filter(filter.clone());

    let file_layer = if config.file {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
            None
        } else {
            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, log_dir, "claw-keepalive.log");

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false) // No ANSI colors in file output
                    .with_writer(file_appender)
                    .with_filter(filter),
            )
        }
    } else {
        None
    };

    let initialized = match file_layer {
        Some(file_layer) => tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init(),
        None => tracing_subscriber::registry().with(console_layer).try_init(),
    };

    if let Err(e) = initialized {
        eprintln!("Warning: logging already initialized: {}", e);
        return;
    }

    if config.file {
        tracing::info!("File logging enabled: {:?}", log_dir);
    }
    tracing::debug!("Logging initialized (level={})", config.level);
}
