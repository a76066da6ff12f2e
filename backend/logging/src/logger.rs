//! Leveled structured logger.
//!
//! A [`Logger`] binds a sink and a minimum level. Records below the minimum
//! are dropped before any encoding work. `DPanic`, `Panic` and `Fatal`
//! records additionally hand a [`Termination`] to the logger's
//! [`Terminator`], whether or not the record itself was written.

use std::io::Write;
use std::panic::Location;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use crate::encoder::{self, Record};
use crate::error::LogError;
use crate::field::Field;
use crate::level::{Level, Termination};
use crate::sink::LockedSink;

/// Receives the control-flow effect of a terminating record.
pub trait Terminator: Send + Sync {
    fn terminate(&self, effect: Termination, message: &str);
}

/// Panics or exits the process for real.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, effect: Termination, message: &str) {
        match effect {
            Termination::None => {}
            Termination::Panic => panic!("{message}"),
            Termination::Exit(code) => std::process::exit(code),
        }
    }
}

/// Remembers every effect instead of acting on it.
#[derive(Debug, Clone, Default)]
pub struct RecordingTerminator {
    seen: Arc<Mutex<Vec<(Termination, String)>>>,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> Vec<(Termination, String)> {
        self.seen.lock().clone()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, effect: Termination, message: &str) {
        self.seen.lock().push((effect, message.to_string()));
    }
}

/// Structured logger writing one JSON object per record.
///
/// Cloning is cheap; clones and child loggers share the sink.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<LockedSink>,
    level: Level,
    name: Option<String>,
    context: Vec<Field>,
    development: bool,
    add_caller: bool,
    terminator: Arc<dyn Terminator>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("name", &self.name)
            .field("context", &self.context.len())
            .field("development", &self.development)
            .field("add_caller", &self.add_caller)
            .finish_non_exhaustive()
    }
}

impl Default for Logger {
    /// Standard error at `Info`.
    fn default() -> Self {
        Logger::new(std::io::stderr(), Level::Info)
    }
}

impl Logger {
    /// Create a logger writing to `sink`, emitting records at `level` and above.
    pub fn new<W: Write + Send + 'static>(sink: W, level: Level) -> Self {
        Self {
            sink: Arc::new(LockedSink::new(sink)),
            level,
            name: None,
            context: Vec::new(),
            development: false,
            add_caller: true,
            terminator: Arc::new(ProcessTerminator),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_development(&self) -> bool {
        self.development
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.level.enables(level)
    }

    pub(crate) fn adds_caller(&self) -> bool {
        self.add_caller
    }

    /// Child logger with a name segment appended (`parent.child`).
    pub fn named(&self, name: &str) -> Self {
        let mut child = self.clone();
        child.name = Some(match &self.name {
            Some(parent) if !name.is_empty() => format!("{parent}.{name}"),
            Some(parent) => parent.clone(),
            None => name.to_string(),
        });
        child
    }

    /// Child logger that attaches `fields` to every record.
    pub fn with<I: IntoIterator<Item = Field>>(&self, fields: I) -> Self {
        let mut child = self.clone();
        child.context.extend(fields.into_iter().filter(|f| !f.is_skip()));
        child
    }

    /// In development mode `DPanic` records panic.
    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn with_caller(mut self, add_caller: bool) -> Self {
        self.add_caller = add_caller;
        self
    }

    pub fn with_terminator<T: Terminator + 'static>(mut self, terminator: T) -> Self {
        self.terminator = Arc::new(terminator);
        self
    }

    /// Log `msg` at `level` with `fields`, then apply the level's termination.
    #[track_caller]
    pub fn log<I: IntoIterator<Item = Field>>(&self, level: Level, msg: &str, fields: I) {
        if self.enabled(level) {
            let fields: Vec<Field> = fields.into_iter().collect();
            let location = Location::caller();
            let caller = self.add_caller.then(|| encoder::caller_string(location));
            self.write(level, msg, &fields, caller.as_deref());
            // Anything above Error may end the process; don't leave it buffered.
            if level > Level::Error {
                let _ = self.sync();
            }
        }
        self.terminate(level, msg);
    }

    #[track_caller]
    pub fn debug<I: IntoIterator<Item = Field>>(&self, msg: &str, fields: I) {
        self.log(Level::Debug, msg, fields)
    }

    #[track_caller]
    pub fn info<I: IntoIterator<Item = Field>>(&self, msg: &str, fields: I) {
        self.log(Level::Info, msg, fields)
    }

    #[track_caller]
    pub fn warn<I: IntoIterator<Item = Field>>(&self, msg: &str, fields: I) {
        self.log(Level::Warn, msg, fields)
    }

    #[track_caller]
    pub fn error<I: IntoIterator<Item = Field>>(&self, msg: &str, fields: I) {
        self.log(Level::Error, msg, fields)
    }

    /// Panics after logging in development mode; plain error otherwise.
    #[track_caller]
    pub fn dpanic<I: IntoIterator<Item = Field>>(&self, msg: &str, fields: I) {
        self.log(Level::DPanic, msg, fields)
    }

    /// Logs, then panics through the terminator.
    #[track_caller]
    pub fn panic<I: IntoIterator<Item = Field>>(&self, msg: &str, fields: I) {
        self.log(Level::Panic, msg, fields)
    }

    /// Logs, flushes, then exits the process with status 1 through the terminator.
    #[track_caller]
    pub fn fatal<I: IntoIterator<Item = Field>>(&self, msg: &str, fields: I) {
        self.log(Level::Fatal, msg, fields)
    }

    /// Flush buffered output.
    pub fn sync(&self) -> Result<(), LogError> {
        self.sink.flush().map_err(LogError::Sync)
    }

    /// Encode and write one record, bypassing termination.
    pub(crate) fn write(&self, level: Level, msg: &str, fields: &[Field], caller: Option<&str>) {
        let record = Record {
            level,
            time: Utc::now(),
            name: self.name.as_deref(),
            caller,
            message: msg,
            context: &self.context,
            fields,
        };
        if let Err(err) = self.sink.write_record(&encoder::encode(&record)) {
            // Reporting through tracing could loop back into this sink.
            let _ = writeln!(std::io::stderr(), "{} log write error: {err}", Utc::now().to_rfc3339());
        }
    }

    fn terminate(&self, level: Level, msg: &str) {
        let effect = level.termination(self.development);
        if effect == Termination::None {
            return;
        }
        if let Termination::Exit(_) = effect {
            let _ = self.sync();
        }
        self.terminator.terminate(effect, msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field;
    use crate::sink::MemorySink;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn memory_logger(level: Level) -> (Logger, MemorySink, RecordingTerminator) {
        let sink = MemorySink::new();
        let terminator = RecordingTerminator::new();
        let logger = Logger::new(sink.clone(), level).with_terminator(terminator.clone());
        (logger, sink, terminator)
    }

    #[test]
    fn writes_iff_level_at_or_above_minimum() {
        for min in Level::ALL {
            for level in Level::ALL {
                let (logger, sink, _) = memory_logger(min);
                logger.log(level, "probe", []);
                assert_eq!(sink.records().len(), usize::from(level >= min), "min={min} level={level}");
            }
        }
    }

    #[test]
    fn warn_logger_keeps_only_error_record() {
        let (logger, sink, _) = memory_logger(Level::Warn);
        logger.info("starting up", [field::string("phase", "init")]);
        logger.error("connection refused", [field::int64("port", 5432)]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["level"], "error");
        assert_eq!(records[0]["msg"], "connection refused");
        assert_eq!(records[0]["port"], 5432);
    }

    #[test]
    fn skip_field_adds_no_key() {
        let (logger, sink, _) = memory_logger(Level::Debug);
        logger.info("plain", []);
        logger.info("plain", [field::skip()]);
        let lines = sink.lines();
        let strip_ts = |l: &String| {
            let mut v: serde_json::Value = serde_json::from_str(l).unwrap();
            v.as_object_mut().unwrap().remove("ts");
            v.as_object_mut().unwrap().remove("caller");
            v
        };
        assert_eq!(strip_ts(&lines[0]), strip_ts(&lines[1]));
        assert_eq!(sink.records()[1].as_object().unwrap().len(), 4);
    }

    #[test]
    fn caller_points_at_call_site() {
        let (logger, sink, _) = memory_logger(Level::Info);
        let line = line!() + 1;
        logger.info("here", []);
        assert_eq!(sink.records()[0]["caller"], format!("src/logger.rs:{line}"));

        let (logger, sink, _) = memory_logger(Level::Info);
        logger.with_caller(false).info("nowhere", []);
        assert!(sink.records()[0].get("caller").is_none());
    }

    #[test]
    fn child_loggers_share_sink_and_carry_context() {
        let (logger, sink, _) = memory_logger(Level::Info);
        let child = logger
            .named("db")
            .named("pool")
            .with([field::string("shard", "eu-1"), field::skip()]);
        child.warn("slow query", [field::duration("took", std::time::Duration::from_secs(2))]);
        logger.info("parent", []);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["logger"], "db.pool");
        assert_eq!(records[0]["shard"], "eu-1");
        assert_eq!(records[0]["took"], 2.0);
        assert!(records[1].get("shard").is_none());
        assert!(records[1].get("logger").is_none());
    }

    #[test]
    fn panic_and_fatal_reach_terminator() {
        let (logger, sink, terminator) = memory_logger(Level::Info);
        logger.panic("invariant broken", []);
        logger.fatal("cannot continue", []);
        assert_eq!(
            terminator.effects(),
            vec![
                (Termination::Panic, "invariant broken".to_string()),
                (Termination::Exit(1), "cannot continue".to_string()),
            ]
        );
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn dpanic_only_terminates_in_development() {
        let (logger, _, terminator) = memory_logger(Level::Info);
        logger.dpanic("odd state", []);
        assert!(terminator.effects().is_empty());

        let dev = logger.development(true);
        dev.dpanic("odd state", []);
        assert_eq!(terminator.effects(), vec![(Termination::Panic, "odd state".to_string())]);
    }

    #[test]
    fn termination_applies_even_when_filtered() {
        let (logger, sink, terminator) = memory_logger(Level::Fatal);
        logger.panic("filtered", []);
        assert!(sink.is_empty());
        assert_eq!(terminator.effects().len(), 1);
    }

    #[test]
    fn default_terminator_unwinds_after_writing() {
        let sink = MemorySink::new();
        let logger = Logger::new(sink.clone(), Level::Info);
        let result = catch_unwind(AssertUnwindSafe(|| logger.panic("boom", [])));
        assert!(result.is_err());
        assert_eq!(sink.records()[0]["level"], "panic");
    }

    #[test]
    fn severe_records_are_flushed_before_unwinding() {
        let sink = MemorySink::new();
        let logger = Logger::new(std::io::BufWriter::new(sink.clone()), Level::Info);
        logger.info("buffered", []);
        assert!(sink.is_empty());

        let result = catch_unwind(AssertUnwindSafe(|| logger.panic("boom", [])));
        assert!(result.is_err());
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["msg"], "boom");
    }

    #[test]
    fn production_dpanic_is_flushed() {
        let sink = MemorySink::new();
        let logger = Logger::new(std::io::BufWriter::new(sink.clone()), Level::Info)
            .with_terminator(RecordingTerminator::new());
        logger.error("still buffered", []);
        assert!(sink.is_empty());
        logger.dpanic("odd state", []);
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn sync_flushes_sink() {
        let (logger, _, _) = memory_logger(Level::Info);
        assert!(logger.sync().is_ok());
        assert!(Logger::default().sync().is_ok());
    }

    #[test]
    fn sync_surfaces_flush_errors() {
        struct BrokenPipe;
        impl Write for BrokenPipe {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
            }
        }
        let logger = Logger::new(BrokenPipe, Level::Info);
        assert!(matches!(logger.sync(), Err(LogError::Sync(_))));
    }

    #[test]
    fn concurrent_logging_produces_whole_records() {
        let (logger, sink, _) = memory_logger(Level::Info);
        std::thread::scope(|s| {
            for i in 0..4 {
                let logger = logger.clone();
                s.spawn(move || {
                    for j in 0..25 {
                        logger.info("tick", [field::int64("worker", i), field::int64("n", j)]);
                    }
                });
            }
        });
        assert_eq!(sink.records().len(), 100);
    }
}
