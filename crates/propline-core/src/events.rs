// Structured event reporting shared by every pipeline stage.
//
// Components never log directly; they push `Event`s into an injected
// `EventSink`. The application forwards them to tracing, tests collect them.

use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// The condition taxonomy. Only `EmptyResult` ends a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    SourceUnavailable,
    MalformedRecord,
    UnmatchedOcrLine,
    EmptyResult,
}

impl EventKind {
    pub fn default_severity(self) -> Severity {
        match self {
            EventKind::SourceUnavailable | EventKind::EmptyResult => Severity::Error,
            EventKind::MalformedRecord | EventKind::UnmatchedOcrLine => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub severity: Severity,
    pub message: String,
}

impl Event {
    /// Build an event with the kind's usual severity.
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Event {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(EventKind::MalformedRecord, message)
    }

    pub fn unmatched(message: impl Into<String>) -> Self {
        Self::new(EventKind::UnmatchedOcrLine, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(EventKind::SourceUnavailable, message)
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(EventKind::EmptyResult, message)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

pub trait EventSink {
    fn emit(&mut self, event: Event);
}

/// Collects events in memory.
impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

/// Forwards events to the `tracing` subscriber installed by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: Event) {
        match event.severity {
            Severity::Info => info!(kind = ?event.kind, "{}", event.message),
            Severity::Warning => warn!(kind = ?event.kind, "{}", event.message),
            Severity::Error => error!(kind = ?event.kind, "{}", event.message),
        }
    }
}

/// Counts events per severity while forwarding them to an inner sink.
#[derive(Debug)]
pub struct CountingSink<S> {
    inner: S,
    warnings: usize,
    errors: usize,
}

impl<S: EventSink> CountingSink<S> {
    pub fn new(inner: S) -> Self {
        CountingSink {
            inner,
            warnings: 0,
            errors: 0,
        }
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EventSink> EventSink for CountingSink<S> {
    fn emit(&mut self, event: Event) {
        match event.severity {
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
            Severity::Info => {}
        }
        self.inner.emit(event);
    }
}
