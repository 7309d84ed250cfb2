//! Where script executions report progress and failures.
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Receives the informational and error messages produced while executing a script.
///
/// Messages arrive pre-formatted as [`fmt::Arguments`], so callers use the usual
/// `format_args!` template syntax.
pub trait LogSink {
    fn info(&self, message: fmt::Arguments<'_>);

    fn error(&self, message: fmt::Arguments<'_>);
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn info(&self, message: fmt::Arguments<'_>) {
        (**self).info(message)
    }

    fn error(&self, message: fmt::Arguments<'_>) {
        (**self).error(message)
    }
}

/// Forwards messages to the [`log`] facade.
#[derive(Debug, Clone)]
pub struct LogFacade {
    target: &'static str,
}

impl Default for LogFacade {
    fn default() -> Self {
        Self {
            target: module_path!(),
        }
    }
}

impl LogFacade {
    /// Log under a custom target instead of this module's path.
    pub fn with_target(target: &'static str) -> Self {
        Self { target }
    }
}

impl LogSink for LogFacade {
    fn info(&self, message: fmt::Arguments<'_>) {
        log::info!(target: self.target, "{message}");
    }

    fn error(&self, message: fmt::Arguments<'_>) {
        log::error!(target: self.target, "{message}");
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Error,
}

/// Keeps every message in memory, in the order received.
#[derive(Debug, Default)]
pub struct RecordingLog {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages recorded at `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(entry_level, _)| *entry_level == level)
            .map(|(_, message)| message)
            .collect()
    }

    fn record(&self, level: LogLevel, message: fmt::Arguments<'_>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}

impl LogSink for RecordingLog {
    fn info(&self, message: fmt::Arguments<'_>) {
        self.record(LogLevel::Info, message)
    }

    fn error(&self, message: fmt::Arguments<'_>) {
        self.record(LogLevel::Error, message)
    }
}
