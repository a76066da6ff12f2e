//! `tracing` integration.
//!
//! [`FacadeLayer`] turns `tracing` events into facade records so libraries
//! instrumented with `tracing` end up in the same JSON stream. Tracing levels
//! top out at `ERROR`, so bridged events never panic or exit.

use std::fmt;

use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::encoder::short_caller;
use crate::error::LogError;
use crate::field::{self, Field};
use crate::level::Level;
use crate::logger::Logger;

/// Key under which the event's target is attached.
pub const TARGET_KEY: &str = "target";

/// Forwards every `tracing` event to a [`Logger`].
#[derive(Debug, Clone)]
pub struct FacadeLayer {
    logger: Logger,
}

impl FacadeLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: Vec<Field>,
}

impl Visit for FieldCollector {
    fn record_str(&mut self, f: &TracingField, value: &str) {
        if f.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(field::string(f.name(), value));
        }
    }

    fn record_bool(&mut self, f: &TracingField, value: bool) {
        self.fields.push(field::bool(f.name(), value));
    }

    fn record_i64(&mut self, f: &TracingField, value: i64) {
        self.fields.push(field::int64(f.name(), value));
    }

    fn record_u64(&mut self, f: &TracingField, value: u64) {
        self.fields.push(field::uint64(f.name(), value));
    }

    fn record_f64(&mut self, f: &TracingField, value: f64) {
        self.fields.push(field::float64(f.name(), value));
    }

    fn record_error(&mut self, f: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.fields.push(field::named_error(f.name(), value));
    }

    fn record_debug(&mut self, f: &TracingField, value: &dyn fmt::Debug) {
        if f.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(field::string(f.name(), format!("{value:?}")));
        }
    }
}

impl<S: Subscriber> Layer<S> for FacadeLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = Level::from(*meta.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        collector.fields.push(field::string(TARGET_KEY, meta.target()));

        let caller = if self.logger.adds_caller() {
            meta.file().zip(meta.line()).map(|(file, line)| short_caller(file, line))
        } else {
            None
        };
        self.logger
            .write(level, &collector.message, &collector.fields, caller.as_deref());
    }
}

/// Install a global subscriber that routes `tracing` events into `logger`.
///
/// `RUST_LOG` takes precedence over `directives` when set.
pub fn init_tracing(logger: Logger, directives: &str) -> Result<(), LogError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .map_err(|e| LogError::TracingInit(e.to_string()))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(FacadeLayer::new(logger))
        .try_init()
        .map_err(|e| LogError::TracingInit(e.to_string()))
}
