//! Process-wide default logger.
//!
//! The default starts as standard error at `Info`. The package-level
//! functions below look the current default up on every call, so after
//! [`reset_default`] they log to the new instance. A handle obtained from
//! [`default_logger`] before a reset keeps pointing at the old one.

use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;

use crate::error::LogError;
use crate::field::Field;
use crate::level::Level;
use crate::logger::Logger;

static DEFAULT: Lazy<ArcSwap<Logger>> = Lazy::new(|| ArcSwap::from_pointee(Logger::default()));

/// The current default logger.
pub fn default_logger() -> Arc<Logger> {
    DEFAULT.load_full()
}

/// Replace the default logger. Safe to call while other threads log; calls
/// already in flight finish on the instance they started with.
pub fn reset_default(logger: Logger) {
    let level = logger.level();
    DEFAULT.store(Arc::new(logger));
    tracing::debug!(%level, "default logger replaced");
}

/// Flush the default logger.
pub fn sync() -> Result<(), LogError> {
    DEFAULT.load().sync()
}

#[track_caller]
pub fn log<I: IntoIterator<Item = Field>>(level: Level, msg: &str, fields: I) {
    DEFAULT.load().log(level, msg, fields)
}

#[track_caller]
pub fn debug<I: IntoIterator<Item = Field>>(msg: &str, fields: I) {
    DEFAULT.load().debug(msg, fields)
}

#[track_caller]
pub fn info<I: IntoIterator<Item = Field>>(msg: &str, fields: I) {
    DEFAULT.load().info(msg, fields)
}

#[track_caller]
pub fn warn<I: IntoIterator<Item = Field>>(msg: &str, fields: I) {
    DEFAULT.load().warn(msg, fields)
}

#[track_caller]
pub fn error<I: IntoIterator<Item = Field>>(msg: &str, fields: I) {
    DEFAULT.load().error(msg, fields)
}

#[track_caller]
pub fn dpanic<I: IntoIterator<Item = Field>>(msg: &str, fields: I) {
    DEFAULT.load().dpanic(msg, fields)
}

#[track_caller]
pub fn panic<I: IntoIterator<Item = Field>>(msg: &str, fields: I) {
    DEFAULT.load().panic(msg, fields)
}

#[track_caller]
pub fn fatal<I: IntoIterator<Item = Field>>(msg: &str, fields: I) {
    DEFAULT.load().fatal(msg, fields)
}
