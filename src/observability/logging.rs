//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Change the log level at runtime
//! - Switch timestamps between local/UTC and second/microsecond precision
//! - Redirect output between stderr and a log file
//!
//! # Design Decisions
//! - Level changes go through a `reload` layer wrapping an `EnvFilter`
//! - The timer and writer read shared state on every event, so flag and
//!   file changes take effect on the next line logged
//! - None of these operations touch the config store

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{layer::SubscriberExt, reload, EnvFilter, Registry};

/// Logging collaborator driven by the applier.
pub trait LogControl: Send + Sync {
    /// Set the numeric log level.
    fn set_level(&self, level: u32);

    fn set_utc(&self, utc: bool);

    fn set_micro(&self, micro: bool);

    /// Close the current log file, falling back to stderr.
    fn close(&self);

    /// Send output to `path`, appending.
    fn open_file(&self, path: &Path) -> io::Result<()>;
}

/// Map the daemon's numeric levels onto tracing levels.
///
/// 0 debug, 1 info, 2 important (info), 3 warning, 4 and above error.
pub fn level_filter(level: u32) -> LevelFilter {
    match level {
        0 => LevelFilter::DEBUG,
        1 | 2 => LevelFilter::INFO,
        3 => LevelFilter::WARN,
        _ => LevelFilter::ERROR,
    }
}

const SECONDS: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const MICROS: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

/// Timestamp formatter controlled by the `LogUTC` and `LogMicro` flags.
#[derive(Debug, Clone, Default)]
pub struct Timestamps {
    utc: Arc<AtomicBool>,
    micro: Arc<AtomicBool>,
}

impl Timestamps {
    pub fn set_utc(&self, utc: bool) {
        self.utc.store(utc, Ordering::Relaxed);
    }

    pub fn set_micro(&self, micro: bool) {
        self.micro.store(micro, Ordering::Relaxed);
    }

    fn now(&self) -> OffsetDateTime {
        if self.utc.load(Ordering::Relaxed) {
            OffsetDateTime::now_utc()
        } else {
            OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
        }
    }
}

impl FormatTime for Timestamps {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let format = if self.micro.load(Ordering::Relaxed) { MICROS } else { SECONDS };
        let text = self.now().format(format).map_err(|_| std::fmt::Error)?;
        w.write_str(&text)
    }
}

/// Log destination: a file when one is open, stderr otherwise.
#[derive(Clone, Default)]
pub struct LogOutput {
    file: Arc<Mutex<Option<RollingFileAppender>>>,
}

impl LogOutput {
    fn slot(&self) -> MutexGuard<'_, Option<RollingFileAppender>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append to `path`. The file is never rotated; external tools own that.
    pub fn open(&self, path: &Path) -> io::Result<()> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name")
            })?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name)
            .build(dir)
            .map_err(io::Error::other)?;
        *self.slot() = Some(appender);
        Ok(())
    }

    pub fn close(&self) {
        if let Some(mut file) = self.slot().take() {
            let _ = file.flush();
        }
    }

    pub fn is_file(&self) -> bool {
        self.slot().is_some()
    }
}

impl std::fmt::Debug for LogOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogOutput").field("is_file", &self.is_file()).finish()
    }
}

/// Writer handed to the fmt layer for a single event.
pub struct OutputGuard<'a> {
    file: MutexGuard<'a, Option<RollingFileAppender>>,
}

impl Write for OutputGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.as_mut() {
            Some(file) => file.write(buf),
            None => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => io::stderr().flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogOutput {
    type Writer = OutputGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        OutputGuard { file: self.slot() }
    }
}

/// [`LogControl`] backed by the global tracing subscriber.
pub struct TracingLog {
    filter: reload::Handle<EnvFilter, Registry>,
    timestamps: Timestamps,
    output: LogOutput,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `initial_level` at startup; later `set_level` calls
/// replace whichever was used.
pub fn init(initial_level: Option<u32>) -> Result<TracingLog, TryInitError> {
    let initial = level_filter(initial_level.unwrap_or(1));
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(initial.into()));
    let (filter, handle) = reload::Layer::new(env_filter);

    let timestamps = Timestamps::default();
    let output = LogOutput::default();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(timestamps.clone())
                .with_writer(output.clone()),
        )
        .try_init()?;

    Ok(TracingLog {
        filter: handle,
        timestamps,
        output,
    })
}

impl LogControl for TracingLog {
    fn set_level(&self, level: u32) {
        let filter = level_filter(level);
        if let Err(e) = self.filter.reload(EnvFilter::default().add_directive(filter.into())) {
            tracing::warn!(level, error = %e, "Unable to change log level");
            return;
        }
        tracing::debug!(level, filter = %filter, "Log level changed");
    }

    fn set_utc(&self, utc: bool) {
        self.timestamps.set_utc(utc);
    }

    fn set_micro(&self, micro: bool) {
        self.timestamps.set_micro(micro);
    }

    fn close(&self) {
        self.output.close();
    }

    fn open_file(&self, path: &Path) -> io::Result<()> {
        self.output.open(path)?;
        tracing::info!(path = %path.display(), "Logging to file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_levels_map_to_filters() {
        assert_eq!(level_filter(0), LevelFilter::DEBUG);
        assert_eq!(level_filter(1), LevelFilter::INFO);
        assert_eq!(level_filter(2), LevelFilter::INFO);
        assert_eq!(level_filter(3), LevelFilter::WARN);
        assert_eq!(level_filter(4), LevelFilter::ERROR);
        assert_eq!(level_filter(99), LevelFilter::ERROR);
    }

    #[test]
    fn micro_flag_adds_subseconds() {
        let timestamps = Timestamps::default();
        timestamps.set_utc(true);

        let mut plain = String::new();
        timestamps.format_time(&mut Writer::new(&mut plain)).unwrap();
        assert_eq!(plain.len(), "2024-01-01 00:00:00".len());

        timestamps.set_micro(true);
        let mut micro = String::new();
        timestamps.format_time(&mut Writer::new(&mut micro)).unwrap();
        assert_eq!(micro.len(), "2024-01-01 00:00:00.000000".len());
    }

    #[test]
    fn output_switches_to_file_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.log");
        let output = LogOutput::default();

        output.open(&path).unwrap();
        assert!(output.is_file());
        output.make_writer().write_all(b"hello\n").unwrap();
        output.close();
        assert!(!output.is_file());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn reopening_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.log");
        std::fs::write(&path, "earlier\n").unwrap();
        let output = LogOutput::default();

        output.open(&path).unwrap();
        output.make_writer().write_all(b"later\n").unwrap();
        output.close();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        let output = LogOutput::default();
        assert!(output.open(Path::new("/")).is_err());
        assert!(!output.is_file());
    }
}
