// Licensed under the Apache-2.0 license

//! Logging shared by the driver modules.
//!
//! Drivers take a [`Logger`] as a generic parameter that defaults to
//! [`NoOpLogger`], so a build without a console pays nothing for it.

use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

pub trait Logger {
    fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>);

    fn debug(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    fn warn(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    fn error(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&mut self, _level: LogLevel, _args: fmt::Arguments<'_>) {}
}

/// Writes one `[LEVEL] message` line per record to an `embedded_io` sink,
/// typically a UART. Messages below `min_level` are dropped.
pub struct WriterLogger<W: embedded_io::Write> {
    writer: W,
    min_level: LogLevel,
}

impl<W: embedded_io::Write> WriterLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            min_level: LogLevel::Debug,
        }
    }

    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: embedded_io::Write> Logger for WriterLogger<W> {
    fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        if level < self.min_level {
            return;
        }
        // Write errors are dropped.
        let _ = write!(self.writer, "[{}] ", level.as_str());
        let _ = self.writer.write_fmt(args);
        let _ = self.writer.write_all(b"\r\n");
    }
}
