use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_ENV: &str = "PIXELPET_LOG";
pub const LOG_DIR_ENV: &str = "PIXELPET_LOG_DIR";
const LOG_FILE_PREFIX: &str = "pixelpet.log";
const MAX_PANEL_LINES: usize = 500;
const LOG_RETENTION_DAYS: u64 = 7;

/// Log severity as shown in the event log panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&tracing::Level> for LogLevel {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

/// Bounded, shared ring of recent log entries.
///
/// Cloning shares the same ring. When full, the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, entry: LogEntry) {
        if let Ok(mut ring) = self.entries.lock() {
            while ring.len() >= self.capacity {
                ring.pop_front();
            }
            ring.push_back(entry);
        }
    }

    /// The newest `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(ring) => ring.iter().skip(ring.len().saturating_sub(n)).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|ring| ring.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Directory for rolling log files.
///
/// `PIXELPET_LOG_DIR` wins; otherwise `~/Library/Logs/pixelpet` on macOS and
/// `<data_dir>/pixelpet/logs` elsewhere.
pub fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(LOG_DIR_ENV) {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs::home_dir() {
            return home.join("Library").join("Logs").join("pixelpet");
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Some(data) = dirs::data_dir() {
            return data.join("pixelpet").join("logs");
        }
    }

    PathBuf::from("logs")
}

/// Delete our rolled log files older than `max_age`.
///
/// Only `pixelpet.log*` files are touched in case the directory is shared.
fn cleanup_old_logs(dir: &Path, max_age: Duration) {
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return;
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX) {
            continue;
        }
        let stale = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .is_ok_and(|modified| modified < cutoff);
        if stale {
            let _ = std::fs::remove_file(entry.path());
        }
    }
}

/// Tracing layer feeding the in-app log panel.
struct PanelLayer {
    buffer: LogBuffer,
}

impl<S: tracing::Subscriber> Layer<S> for PanelLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.buffer.push(LogEntry {
            level: event.metadata().level().into(),
            target: event.metadata().target().to_string(),
            message: visitor.finish(),
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message, self.fields.is_empty()) {
            (Some(msg), true) => msg,
            (Some(msg), false) => format!("{msg} {}", self.fields.join(" ")),
            (None, _) => self.fields.join(" "),
        }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }
}

/// Install the global subscriber and return the buffer behind the log panel.
///
/// Filter comes from `PIXELPET_LOG`, then `RUST_LOG`, default `info`. Files
/// roll daily under [`log_dir`] and are kept for a week. Nothing goes to
/// stdout or stderr, which belong to the terminal UI.
pub fn init() -> LogBuffer {
    let buffer = LogBuffer::new(MAX_PANEL_LINES);

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let dir = log_dir();
    let file_layer = match std::fs::create_dir_all(&dir) {
        Ok(()) => {
            cleanup_old_logs(&dir, Duration::from_secs(LOG_RETENTION_DAYS * 86_400));
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(rolling::daily(&dir, LOG_FILE_PREFIX))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        Err(_) => None,
    };
    let file_logging = file_layer.is_some();

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(PanelLayer {
            buffer: buffer.clone(),
        })
        .init();

    if !file_logging {
        tracing::warn!(dir = %dir.display(), "log directory unavailable; file logging disabled");
    }

    buffer
}
