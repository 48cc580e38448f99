use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Daily rotated file holding every entry that passes the filter
pub const LOG_FILE: &str = "noticeboard.log";

/// Daily rotated file holding only `ERROR` entries
pub const ERROR_LOG_FILE: &str = "noticeboard-error.log";

/// Keeps the file writers alive; dropping it flushes pending entries
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level`. Console output always goes to
/// stderr. When `directory` is given, entries are also written to a daily
/// rotated [`LOG_FILE`] there, as JSON if `json` is set, and errors are
/// copied to [`ERROR_LOG_FILE`].
pub fn init_logging(level: &str, directory: Option<&Path>, json: bool) -> Result<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    let mut guards = Vec::new();
    let (file, error_file) = match directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE));
            guards.push(guard);
            let file = if json {
                fmt::layer().json().with_writer(writer).boxed()
            } else {
                fmt::layer().with_ansi(false).with_writer(writer).boxed()
            };

            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
                dir,
                ERROR_LOG_FILE,
            ));
            guards.push(guard);
            let error_file = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(LevelFilter::ERROR)
                .boxed();

            (Some(file), Some(error_file))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .with(error_file)
        .try_init()?;

    Ok(LoggingGuard { _guards: guards })
}
