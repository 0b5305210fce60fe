use std::path::Path;

use once_cell::sync::OnceCell;
use tracing::warn;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{AppError, AppResult};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();
static LOGGER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

const DEFAULT_LOG_DIRECTIVES: &str = "info,app::ai=debug,app::timing=info,app::store=info";
const LOG_FILE_PREFIX: &str = "tripwise.log";

/// Installs the global subscriber: a daily rolling file under `log_dir` plus
/// console output. Later calls are no-ops.
///
/// When the host process already installed a global subscriber, that one is
/// kept and events flow to it instead.
pub fn init_logging(log_dir: &Path) -> AppResult<()> {
    LOGGER_INIT.get_or_try_init(|| install(log_dir)).map(|_| ())
}

fn install(log_dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES))
        .map_err(|err| AppError::other(format!("invalid log filter: {err}")))?;

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .try_init();

    match installed {
        Ok(()) => {
            // The guard only matters once our file writer is live.
            if LOGGER_GUARD.set(guard).is_err() {
                warn!(target: "app::logging", "log writer guard was already stored");
            }
        }
        Err(err) => {
            warn!(
                target: "app::logging",
                error = %err,
                "global subscriber already installed; keeping the host's logging"
            );
        }
    }

    Ok(())
}
