//! Structured logging setup: an `EnvFilter` layered with a `fmt` layer,
//! switching between compact and JSON output.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use almwork_config::LogFormat;

/// Initializes the global `tracing` subscriber once for the process.
///
/// `RUST_LOG` overrides the default filter (`almwork=info,warn`) when set,
/// via `EnvFilter::try_from_default_env`'s usual precedence.
pub fn init(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("almwork=info,warn"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_target(true).with_current_span(true))
                .try_init()?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_line_number(false)
                        .with_file(false)
                        .compact(),
                )
                .try_init()?;
        }
    }

    Ok(())
}
