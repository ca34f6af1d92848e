//! Standard-error backend for the `log` facade.
//!
//! The core library only emits records; this logger renders them as
//! `rebuilder: <level>: <message>` lines.

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fmt;
use std::io::Write;

static LOGGER: StderrLogger = StderrLogger;

/// Writes each enabled record as one line on standard error.
#[derive(Debug, Clone, Copy)]
pub struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), record.args());
        if writeln!(std::io::stderr().lock(), "{line}").is_err() {
            // Nowhere left to report the failure.
        }
    }

    fn flush(&self) {
        if std::io::stderr().flush().is_err() {
            // Nowhere left to report the failure.
        }
    }
}

/// Maximum level for the `-v` count and the `-q` flag.
///
/// Warnings are shown by default; `-q` keeps errors only.
#[must_use]
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install [`StderrLogger`] as the global logger.
///
/// # Errors
///
/// Returns an error when a logger is already installed.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

fn format_line(level: Level, message: &fmt::Arguments<'_>) -> String {
    let label = match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    };
    format!("rebuilder: {label}: {message}")
}
