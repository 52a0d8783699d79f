//! File logging for the SDK.
//!
//! Flowgate runs embedded in a host process, so the logger is
//! append-only and `init` is idempotent: the first call fixes the log
//! file, later calls are no-ops and never clobber earlier output.
//! Nothing is written until `init` (or `init_to`) has been called.
//!
//! Three levels cover what the crate actually logs: Info for
//! submission milestones, Debug for identity/config traces
//! (`FLOWGATE_DEBUG=1` enables it), Trace for wire-level detail.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

/// Verbosity threshold for the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Info = 0,
    Debug = 1,
    Trace = 2,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Level::Info,
            1 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

fn debug_env_enabled(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Log to `~/.flowgate/flowgate.log`, honoring `FLOWGATE_DEBUG`.
pub fn init() {
    if std::env::var("FLOWGATE_DEBUG")
        .map(|v| debug_env_enabled(&v))
        .unwrap_or(false)
    {
        set_level(Level::Debug);
    }
    if let Some(dir) = dirs::home_dir().map(|h| h.join(".flowgate")) {
        let _ = std::fs::create_dir_all(&dir);
        init_to(dir.join("flowgate.log"));
    }
}

/// Log to a caller-chosen file. The first path registered wins.
pub fn init_to(path: impl AsRef<Path>) {
    LOG_PATH.set(path.as_ref().to_path_buf()).ok();
}

pub fn set_level(level: Level) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn get_level() -> Level {
    Level::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

fn log_at(level: Level, msg: &str) {
    if level > get_level() {
        return;
    }
    if let Some(path) = LOG_PATH.get() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{}] {}", timestamp, level.as_str(), msg);
        }
    }
}

pub fn info(msg: &str) {
    log_at(Level::Info, msg);
}

pub fn debug(msg: &str) {
    log_at(Level::Debug, msg);
}

pub fn trace(msg: &str) {
    log_at(Level::Trace, msg);
}

/// Log macro for INFO level.
#[macro_export]
macro_rules! flog {
    ($($arg:tt)*) => {
        $crate::log::info(&format!($($arg)*))
    };
}

/// Log macro for DEBUG level.
#[macro_export]
macro_rules! flog_debug {
    ($($arg:tt)*) => {
        $crate::log::debug(&format!($($arg)*))
    };
}

/// Log macro for TRACE level.
#[macro_export]
macro_rules! flog_trace {
    ($($arg:tt)*) => {
        $crate::log::trace(&format!($($arg)*))
    };
}
