//! Centralized logging setup (file + optional stdout)
//!
//! While the dashboard owns the terminal, anything written to stdout would
//! tear the frame, so console mode logs to the file only.

use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::constants::files;

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Dashboard owns stdout; log file only
    FileOnly,
    /// Headless: stdout and the log file
    StdoutAndFile,
}

impl LogOutput {
    #[must_use]
    pub const fn for_console(console_enabled: bool) -> Self {
        if console_enabled {
            Self::FileOnly
        } else {
            Self::StdoutAndFile
        }
    }
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Initialize logging
///
/// Both outputs use the level from `RUST_LOG`, defaulting to "info".
/// The file appender's guard is forgotten so it lives for the program lifetime.
pub fn init_logging(output: LogOutput) {
    let file_appender = tracing_appender::rolling::never(".", files::LOG);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(env_filter());

    let stdout_layer = match output {
        LogOutput::FileOnly => None,
        LogOutput::StdoutAndFile => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(env_filter()),
        ),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    std::mem::forget(guard);
}
