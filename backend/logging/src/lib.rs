//! Leveled structured logging facade.
//!
//! Records are written as one JSON object per line. Use a [`Logger`] directly,
//! or the package-level functions which log through a process-wide default
//! that can be swapped with [`reset_default`].
//!
//! ```no_run
//! use facade_log::{field, Level, Logger};
//!
//! let logger = Logger::new(std::io::stdout(), Level::Warn);
//! logger.error("upstream timed out", [field::string("host", "db-1"), field::int64("attempt", 3)]);
//!
//! facade_log::reset_default(logger);
//! facade_log::warn("using replacement default", []);
//! facade_log::sync().ok();
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod global;
pub mod level;
pub mod logger;
pub mod sink;
pub mod subscriber;

pub use config::{load_config, logger_from_file, LoggerConfig, Output};
pub use error::LogError;
pub use field::{Field, FieldValue};
pub use global::{
    debug, default_logger, dpanic, error, fatal, info, log, panic, reset_default, sync, warn,
};
pub use level::{
    Level, Termination, DEBUG_LEVEL, DPANIC_LEVEL, ERROR_LEVEL, FATAL_LEVEL, INFO_LEVEL,
    PANIC_LEVEL, WARN_LEVEL,
};
pub use logger::{Logger, ProcessTerminator, RecordingTerminator, Terminator};
pub use sink::MemorySink;
pub use subscriber::{init_tracing, FacadeLayer};
