//! Run-scoped logging: a timestamped file plus a colored console mirror.
//!
//! Every line is `[YYYY-MM-DD HH:MM:SS] [LEVEL] message`, appended to a
//! per-run log file and echoed to stderr with level-based coloring when
//! stderr is a terminal.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use colored::Colorize;
use is_terminal::IsTerminal;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Debug,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Debug => "DEBUG",
        };
        f.write_str(tag)
    }
}

pub struct Logger {
    file: Option<Mutex<File>>,
    path: Option<PathBuf>,
    console: bool,
}

impl Logger {
    /// Open a new run log in `dir`, named with the run's start timestamp.
    pub fn create(dir: &Path) -> Result<Self> {
        let name = format!("deploy_{}.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
        let path = dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            file: Some(Mutex::new(file)),
            path: Some(path),
            console: true,
        })
    }

    /// Logger that drops everything. Used by tests.
    pub fn discard() -> Self {
        Self {
            file: None,
            path: None,
            console: false,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(Level::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::Error, message.as_ref());
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(Level::Debug, message.as_ref());
    }

    fn log(&self, level: Level, message: &str) {
        let line = format!(
            "[{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            level,
            message
        );

        if let Some(file) = &self.file {
            if let Ok(mut handle) = file.lock() {
                let _ = writeln!(handle, "{}", line);
            }
        }

        if self.console {
            if std::io::stderr().is_terminal() {
                let colored_line = match level {
                    Level::Info => line.green(),
                    Level::Warn => line.yellow(),
                    Level::Error => line.red(),
                    Level::Debug => line.dimmed(),
                };
                eprintln!("{}", colored_line);
            } else {
                eprintln!("{}", line);
            }
        }
    }
}
