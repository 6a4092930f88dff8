//! Process-wide tracing setup: console plus a daily-rolling log file.
//!
//! `init` may be called any number of times; only the first call installs the
//! subscriber. Components log through `tracing` macros and are told apart by
//! their module-path target (e.g. `news_digest::usecases::analyzer`).

use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "news-digest";
const LOG_FILE_SUFFIX: &str = "log";
/// Rotated files kept on disk.
const MAX_LOG_FILES: usize = 3;

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Filter used when RUST_LOG is unset.
    pub default_level: String,
    pub log_dir: PathBuf,
    pub to_file: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            to_file: true,
        }
    }
}

/// Holds the non-blocking writer's guard for the life of the process; dropping it
/// would stop the file writer.
static LOGGING: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Install the global subscriber. Returns `true` only for the call that did the work.
pub fn init(settings: &LogSettings) -> bool {
    let mut installed = false;
    LOGGING.get_or_init(|| {
        installed = true;
        install(settings)
    });
    installed
}

fn install(settings: &LogSettings) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.default_level));

    let (file_layer, guard, file_error) = if settings.to_file {
        match file_writer(settings) {
            Ok((writer, guard)) => (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
                None,
            ),
            Err(e) => (None, None, Some(e)),
        }
    } else {
        (None, None, None)
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();

    if result.is_err() {
        tracing::debug!("global subscriber already set elsewhere; keeping it");
    }
    if let Some(e) = file_error {
        tracing::warn!(
            dir = %settings.log_dir.display(),
            error = %e,
            "file logging disabled"
        );
    }
    guard
}

fn file_writer(
    settings: &LogSettings,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), String> {
    std::fs::create_dir_all(&settings.log_dir).map_err(|e| e.to_string())?;
    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(&settings.log_dir)
        .map_err(|e| e.to_string())?;
    Ok(tracing_appender::non_blocking(appender))
}
