//! Structured events for match attempts, with a pluggable sink.
//!
//! By default nothing beyond `tracing`'s own instrumentation in
//! `src/engine.rs` is recorded. A host process that wants its own
//! event format (shipping to a log aggregator in a specific schema,
//! say) can install a [`MatchEventLogger`] once at startup via
//! [`set_match_logger`]; every subsequent match attempt reports
//! through it in addition to `tracing`.

use std::fmt::Write as _;
use std::io::Write as IoWrite;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use crate::types::{MatchLevel, MatchScope, MatchType};

/// One match attempt's outcome, reported to whatever [`MatchEventLogger`]
/// is installed.
#[derive(Debug, Clone)]
pub struct MatchEvent {
    pub trace_id: String,
    pub package_name: String,
    pub matched: bool,
    pub match_type: Option<MatchType>,
    pub scope: Option<MatchScope>,
    pub duration_micros: u128,
}

impl MatchEvent {
    /// Render as `key=value` pairs, one line, with values escaped so
    /// embedded spaces or quotes can't be mistaken for field
    /// boundaries by a naive line-oriented log parser.
    pub fn format_key_values(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "trace_id={} ", escape_kv(&self.trace_id));
        let _ = write!(out, "package_name={} ", escape_kv(&self.package_name));
        let _ = write!(out, "matched={} ", self.matched);
        if let Some(match_type) = self.match_type {
            let _ = write!(out, "match_type={match_type:?} ");
        }
        if let Some(scope) = self.scope {
            let _ = write!(out, "scope={scope:?} ");
        }
        let _ = write!(out, "duration_micros={}", self.duration_micros);
        out
    }
}

fn escape_kv(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("{:?}", value)
    } else {
        value.to_string()
    }
}

/// A sink for [`MatchEvent`]s.
pub trait MatchEventLogger: Send + Sync {
    fn log(&self, event: &MatchEvent);
}

/// Writes each event as one `key=value` line to an arbitrary writer
/// (stdout, a file, a test buffer).
pub struct KeyValueLogger {
    writer: Mutex<Box<dyn IoWrite + Send>>,
}

impl KeyValueLogger {
    pub fn new(writer: Box<dyn IoWrite + Send>) -> Self {
        KeyValueLogger {
            writer: Mutex::new(writer),
        }
    }
}

impl MatchEventLogger for KeyValueLogger {
    fn log(&self, event: &MatchEvent) {
        let mut writer = self.writer.lock().expect("logger lock poisoned");
        let _ = writeln!(writer, "{}", event.format_key_values());
    }
}

static MATCH_LOGGER: OnceLock<RwLock<Option<Arc<dyn MatchEventLogger>>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Arc<dyn MatchEventLogger>>> {
    MATCH_LOGGER.get_or_init(|| RwLock::new(None))
}

/// Install (or replace) the process-wide match event logger.
pub fn set_match_logger(logger: Arc<dyn MatchEventLogger>) {
    *slot().write().expect("logger lock poisoned") = Some(logger);
}

/// Remove the installed logger, if any.
pub fn clear_match_logger() {
    *slot().write().expect("logger lock poisoned") = None;
}

/// Report an event to the installed logger, if one is set. A no-op
/// when no logger has been installed.
pub fn report(event: MatchEvent) {
    if let Some(logger) = slot().read().expect("logger lock poisoned").as_ref() {
        logger.log(&event);
    }
}
