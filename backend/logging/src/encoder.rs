//! JSON record encoder.
//!
//! Produces one object per line with the keys `level`, `ts`, `logger`,
//! `caller`, `msg`, followed by fields in the order they were attached.
//! Keys are written in order and never deduplicated.

use std::panic::Location;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::field::{epoch_seconds, Field};
use crate::level::Level;

pub const LEVEL_KEY: &str = "level";
pub const TIME_KEY: &str = "ts";
pub const NAME_KEY: &str = "logger";
pub const CALLER_KEY: &str = "caller";
pub const MESSAGE_KEY: &str = "msg";

/// Everything needed to encode one log line.
#[derive(Debug)]
pub struct Record<'a> {
    pub level: Level,
    pub time: DateTime<Utc>,
    pub name: Option<&'a str>,
    pub caller: Option<&'a str>,
    pub message: &'a str,
    pub context: &'a [Field],
    pub fields: &'a [Field],
}

struct ObjectWriter {
    buf: Vec<u8>,
    empty: bool,
}

impl ObjectWriter {
    fn new() -> Self {
        Self {
            buf: vec![b'{'],
            empty: true,
        }
    }

    fn entry(&mut self, key: &str, value: &Value) {
        if !self.empty {
            self.buf.push(b',');
        }
        self.empty = false;
        // Writing a str or Value into a Vec cannot fail.
        let _ = serde_json::to_writer(&mut self.buf, key);
        self.buf.push(b':');
        let _ = serde_json::to_writer(&mut self.buf, value);
    }

    fn finish(mut self) -> Vec<u8> {
        self.buf.extend_from_slice(b"}\n");
        self.buf
    }
}

/// Short caller form: the last two path components plus the line.
pub fn short_caller(file: &str, line: u32) -> String {
    let file = file.replace('\\', "/");
    let short = match file.rmatch_indices('/').nth(1) {
        Some((idx, _)) => &file[idx + 1..],
        None => file.as_str(),
    };
    format!("{short}:{line}")
}

pub fn caller_string(location: &Location<'_>) -> String {
    short_caller(location.file(), location.line())
}

pub fn encode(record: &Record<'_>) -> Vec<u8> {
    let mut obj = ObjectWriter::new();
    obj.entry(LEVEL_KEY, &Value::String(record.level.as_str().into()));
    obj.entry(TIME_KEY, &Value::from(epoch_seconds(&record.time)));
    if let Some(name) = record.name {
        obj.entry(NAME_KEY, &Value::String(name.into()));
    }
    if let Some(caller) = record.caller {
        obj.entry(CALLER_KEY, &Value::String(caller.into()));
    }
    obj.entry(MESSAGE_KEY, &Value::String(record.message.into()));
    for field in record.context.iter().chain(record.fields) {
        if let Some((key, value)) = field.to_json() {
            obj.entry(&key, &value);
        }
    }
    obj.finish()
}
