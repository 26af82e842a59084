//! Process-wide structured logging
//!
//! JSON records go to stdout; when a log directory is configured they are
//! also written to a daily rotating file. Each session's activity is recorded
//! inside a `session` span carrying its id.

use crate::error::InitializationError;
use std::path::Path;
use std::sync::Mutex;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "deskmate=info,tower_http=info";
const LOG_FILE_PREFIX: &str = "deskmate";

/// `Some` once installed; holds the file writer guard so buffered records
/// are flushed for the life of the process.
static INSTALLED: Mutex<Option<Option<WorkerGuard>>> = Mutex::new(None);

/// Install the global subscriber. Later calls are no-ops.
pub fn init(log_dir: Option<&Path>) -> Result<(), InitializationError> {
    let mut installed = INSTALLED
        .lock()
        .map_err(|_| InitializationError::Logger("logger state poisoned".to_string()))?;
    if installed.is_some() {
        return Ok(());
    }

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .with(file_layer)
        .try_init();

    // Another subscriber (a test harness, an embedding binary) already owns
    // the global slot; records still flow there.
    if let Err(e) = result {
        tracing::debug!(error = %e, "Global subscriber already set");
    }

    *installed = Some(guard);
    Ok(())
}

/// Daily rotating, non-blocking file writer under `dir`
fn file_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard), InitializationError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        InitializationError::Logger(format!("cannot create log directory {}: {e}", dir.display()))
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| InitializationError::Logger(e.to_string()))?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Span that tags every record emitted while handling one session
pub fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("session", session_id = %session_id)
}
