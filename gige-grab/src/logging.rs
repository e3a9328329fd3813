use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};

use time::{UtcOffset, format_description::well_known::Iso8601};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("local time offset out of range: {source}")]
    Offset {
        #[from]
        source: time::error::ComponentRange,
    },
    #[error("cannot create log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("logging already initialized: {source}")]
    AlreadyInitialized {
        #[from]
        source: tracing::subscriber::SetGlobalDefaultError,
    },
}

/// Timestamps in ISO 8601 with the offset of the local timezone at startup.
fn local_timer() -> Result<OffsetTime<Iso8601>, LoggingError> {
    let offset = chrono::Local::now().offset().local_minus_utc();
    Ok(OffsetTime::new(
        UtcOffset::from_whole_seconds(offset)?,
        Iso8601::DEFAULT,
    ))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to the console and, if given, to `log_file`.
///
/// The file gets source locations and no color codes. The level is taken
/// from `RUST_LOG`, falling back to [DEFAULT_FILTER].
pub fn init_logging(log_file: Option<&Path>) -> Result<(), LoggingError> {
    let timer = local_timer()?;

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| LoggingError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
            Some(
                fmt::layer()
                    .with_timer(timer.clone())
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_timer(timer)
        .with_ansi(!cfg!(windows))
        .with_target(false);

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(env_filter());
    tracing::subscriber::set_global_default(subscriber)?;

    match log_file {
        Some(path) => tracing::debug!("logging to console and {}", path.display()),
        None => tracing::debug!("logging to console"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_offset_is_valid() {
        assert!(local_timer().is_ok());
    }

    #[test]
    fn unwritable_log_file() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = tmpdir.path().join("missing-dir").join("log.txt");
        let err = init_logging(Some(&path)).unwrap_err();
        assert!(matches!(err, LoggingError::LogFile { .. }));
    }
}
