//! Log levels.
//!
//! Levels are ordered by severity; a logger at level `L` emits every record
//! whose level is `>= L`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LogError;

/// Severity of a log record. Lower discriminant = more verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i8)]
pub enum Level {
    Debug = -1,
    /// Default level.
    #[default]
    Info = 0,
    Warn = 1,
    Error = 2,
    /// Panics after logging, but only in development mode.
    DPanic = 3,
    /// Logs, then panics.
    Panic = 4,
    /// Logs, then exits the process with status 1.
    Fatal = 5,
}

pub const DEBUG_LEVEL: Level = Level::Debug;
pub const INFO_LEVEL: Level = Level::Info;
pub const WARN_LEVEL: Level = Level::Warn;
pub const ERROR_LEVEL: Level = Level::Error;
pub const DPANIC_LEVEL: Level = Level::DPanic;
pub const PANIC_LEVEL: Level = Level::Panic;
pub const FATAL_LEVEL: Level = Level::Fatal;

/// Exit status used after a fatal record.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Control-flow effect a record has on its caller once it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Return normally.
    None,
    /// Unwind the calling thread.
    Panic,
    /// Flush and exit the process with the given status.
    Exit(i32),
}

impl Level {
    pub const ALL: [Level; 7] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::DPanic,
        Level::Panic,
        Level::Fatal,
    ];

    pub fn as_i8(self) -> i8 {
        self as i8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::DPanic => "dpanic",
            Level::Panic => "panic",
            Level::Fatal => "fatal",
        }
    }

    /// Whether a logger configured at `self` emits a record at `level`.
    pub fn enables(self, level: Level) -> bool {
        level >= self
    }

    /// The effect logging at this level has on the caller.
    pub fn termination(self, development: bool) -> Termination {
        match self {
            Level::DPanic if development => Termination::Panic,
            Level::Panic => Termination::Panic,
            Level::Fatal => Termination::Exit(FATAL_EXIT_CODE),
            _ => Termination::None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, LogError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" | "" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "dpanic" => Ok(Level::DPanic),
            "panic" => Ok(Level::Panic),
            "fatal" => Ok(Level::Fatal),
            _ => Err(LogError::InvalidLevel(s.to_string())),
        }
    }
}

impl TryFrom<i8> for Level {
    type Error = LogError;

    fn try_from(value: i8) -> Result<Self, LogError> {
        Level::ALL
            .into_iter()
            .find(|l| l.as_i8() == value)
            .ok_or_else(|| LogError::InvalidLevel(value.to_string()))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
