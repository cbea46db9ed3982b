//! provides logging helpers

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::{self};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry;

/// Prefix of the rolling log files written into the log directory.
pub const LOG_FILE_PREFIX: &str = "reboot-agent.log";

/// Number of rotated log files kept on disk.
const MAX_LOG_FILES: usize = 3;

fn env_filter() -> filter::EnvFilter {
    filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy()
}

/// initiate the global tracing subscriber
///
/// Logs always go to stderr. When `log_dir` is given, a daily rotating file
/// layer is added as well; the returned guard must be held until exit so the
/// non-blocking writer can flush.
pub fn init<P: AsRef<Path>>(log_dir: Option<P>) -> Option<WorkerGuard> {
    let stderr_layer = layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter());

    let Some(log_dir) = log_dir else {
        registry().with(stderr_layer).init();
        return None;
    };

    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir.as_ref())
    {
        Ok(appender) => appender,
        Err(e) => {
            registry().with(stderr_layer).init();
            tracing::warn!(
                "Failed to create rolling file appender in {}: {e}, logging to stderr only",
                log_dir.as_ref().display()
            );
            return None;
        }
    };

    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
    let file_layer = layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(env_filter());

    registry().with(stderr_layer).with(file_layer).init();
    Some(file_guard)
}
