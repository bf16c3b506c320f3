use std::path::PathBuf;
use std::sync::Once;

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    filter::{Directive, EnvFilter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer,
};

// Define log targets as constants
pub const RECONCILE: &str = "paramex_reconcile";
pub const MATCHER: &str = "paramex_matcher";
pub const EXTRACT: &str = "paramex_extract";
pub const HIGHLIGHT: &str = "paramex_highlight";

static INIT: Once = Once::new();

const DEBUG_TARGETS: &[&str] = &[RECONCILE, MATCHER, EXTRACT, HIGHLIGHT];

fn stderr_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn debug_targets_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    DEBUG_TARGETS
        .iter()
        .filter_map(|target| {
            format!("{}={}", target, level)
                .parse::<Directive>()
                .ok()
        })
        .fold(EnvFilter::new("warn"), |filter, directive| {
            filter.add_directive(directive)
        })
}

/// Log to stderr only. Honours `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logging() {
    INIT.call_once(|| {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(stderr_filter());

        let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
    });
}

/// Log to stderr and additionally write every extraction target to
/// `<log_dir>/paramex.log`.
///
/// The returned guard flushes the file writer when dropped, so the caller
/// must keep it alive for as long as logging is wanted.
pub fn init_logging_with_dir(verbose: bool, log_dir: PathBuf) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::NEVER, log_dir, "paramex.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    INIT.call_once(|| {
        let file_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .with_writer(non_blocking_appender)
            .with_filter(debug_targets_filter(verbose));

        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(stderr_filter());

        let _ = tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .try_init();
    });

    Ok(guard)
}
