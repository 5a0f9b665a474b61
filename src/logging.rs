use std::path::Path;

use tracing::Subscriber;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Build the level filter. When debug logging is disabled we force `info`
/// regardless of `RUST_LOG` so a stray variable in the user's environment
/// does not flood the log file.
pub fn filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    }
}

/// Open an append-only, never-rotating log file. Returns `None` when the
/// location is not writable.
pub fn file_appender(path: &Path) -> Option<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path.file_name()?.to_string_lossy().into_owned();
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .ok()
}

/// Compose the subscriber: optional file sink plus optional stderr echo.
pub fn subscriber(
    debug: bool,
    log_file: Option<&Path>,
    echo_console: bool,
) -> impl Subscriber + Send + Sync + 'static {
    let file_layer = log_file.and_then(file_appender).map(|appender| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(appender)
    });
    let console_layer = echo_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(filter(debug))
        .with(file_layer)
        .with(console_layer)
}

/// Install the global subscriber. Never fails: a second call or an
/// unwritable log location silently degrades.
pub fn init(debug: bool, log_file: Option<&Path>, echo_console: bool) {
    let _ = subscriber(debug, log_file, echo_console).try_init();
}
