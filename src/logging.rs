//! Tracing subscriber setup
//!
//! Logs go to stderr unless `app.log_file_path` names a file, so that
//! `--output-format json` keeps stdout machine-readable. `RUST_LOG` filters
//! (default `compliance_poller=info`) and `LOG_FORMAT=json` switches to JSON
//! lines.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log line format
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "compliance_poller=info";

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON, everything else is text
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    /// Read [`LOG_FORMAT_ENV`]
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

/// `RUST_LOG`, or [`DEFAULT_FILTER`]
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Build a subscriber writing to `writer`.
pub fn subscriber<W>(
    writer: W,
    ansi: bool,
    format: LogFormat,
    filter: EnvFilter,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi);

    match format {
        LogFormat::Json => Box::new(builder.json().finish()),
        LogFormat::Text => Box::new(builder.finish()),
    }
}

/// Open `path` for appending, creating missing parent directories.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
///
/// A log file that cannot be opened falls back to stderr, and the failure is
/// the first thing logged there.
pub fn init_tracing(log_file: Option<&Path>) {
    let format = LogFormat::from_env();

    let fallback = match log_file {
        None => {
            install(subscriber(io::stderr, true, format, default_filter()));
            None
        }
        Some(path) => match open_log_file(path) {
            Ok(file) => {
                install(subscriber(Mutex::new(file), false, format, default_filter()));
                None
            }
            Err(e) => {
                install(subscriber(io::stderr, true, format, default_filter()));
                Some((path, e))
            }
        },
    };

    if let Some((path, e)) = fallback {
        error!(path = %path.display(), error = %e, "Cannot open log file, logging to stderr");
    }
}

fn install(subscriber: Box<dyn Subscriber + Send + Sync>) {
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing subscriber already installed: {e}");
    }
}
