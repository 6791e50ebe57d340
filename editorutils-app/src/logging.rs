use std::fmt;
use std::path::Path;
use std::sync::Arc;

use editorutils_core::meta::NAME;
use parking_lot::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{EnvFilter, Layer, filter::Targets, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the console filter directives
pub const LOG_ENV: &str = "EDITORUTILS_LOG";

/// Shared owner of the log file writer.
///
/// Dropping the last clone, or calling [`LogGuard::flush`], writes out every
/// buffered line. `std::process::exit` skips destructors, so anything exiting
/// that way flushes first.
#[derive(Clone, Default)]
pub struct LogGuard(Arc<Mutex<Option<WorkerGuard>>>);

impl LogGuard {
    pub fn new(guard: Option<WorkerGuard>) -> Self {
        Self(Arc::new(Mutex::new(guard)))
    }

    /// Flush buffered lines and stop the writer. Later lines are dropped.
    pub fn flush(&self) {
        let guard = self.0.lock().take();
        drop(guard);
    }

    pub fn is_active(&self) -> bool {
        self.0.lock().is_some()
    }
}

impl fmt::Debug for LogGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogGuard")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Install the global subscriber.
///
/// Console output is filtered by [`LOG_ENV`] and defaults to `info`. When
/// `log_dir` is usable, debug output of our own crates also goes to a daily
/// rolling file; keep the returned guard alive until exit so it is flushed.
pub fn init_logging(log_dir: Option<&Path>) -> LogGuard {
    let (log_file, guard) = match log_dir.and_then(|dir| {
        tracing_appender::rolling::Builder::new()
            .max_log_files(10)
            .rotation(Rotation::DAILY)
            .filename_prefix(NAME)
            .filename_suffix("log")
            .build(dir)
            .ok()
    }) {
        Some(appender) => {
            let (log_file, guard) = tracing_appender::non_blocking(appender);
            (Some(log_file), Some(guard))
        }
        None => (None, None),
    };

    let console_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();

    let file_filter = Targets::new()
        .with_target("editorutils", LevelFilter::DEBUG)
        .with_target("editorutils_app", LevelFilter::DEBUG)
        .with_target("editorutils_core", LevelFilter::DEBUG)
        .with_default(LevelFilter::INFO);

    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(console_filter),
    );

    let result = if let Some(log_file) = log_file {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(log_file)
                    .with_filter(file_filter),
            )
            .try_init()
    } else {
        registry.try_init()
    };

    if let Err(e) = result {
        eprintln!("Failed to initialise logging: {e}");
    }

    LogGuard::new(guard)
}
