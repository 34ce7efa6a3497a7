//! Tracing subscriber setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogFormat;

/// Install the global subscriber: colored output for dev, JSON for production.
///
/// `RUST_LOG` directives are honored on top of the defaults.
pub fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("reid=info".parse().expect("static directive"))
        .add_directive("ort=warn".parse().expect("static directive"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(env_filter)
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_ansi(true)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .with(env_filter)
                .init();
        }
    }
}
