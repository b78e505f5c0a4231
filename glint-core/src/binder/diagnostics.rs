//! Diagnostics
//!
//! Expression failures never escape the binder. Each one becomes a
//! [`Diagnostic`] handed to the configured [`DiagnosticSink`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dom::NodeId;
use crate::error::EvalError;

/// Where a failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A display expression failed during a render pass.
    Render,
    /// An event handler failed.
    Handler { event_type: String },
    /// A directive could not be registered.
    Registration,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Render => f.write_str("render"),
            DiagnosticKind::Handler { event_type } => write!(f, "handler `{event_type}`"),
            DiagnosticKind::Registration => f.write_str("registration"),
        }
    }
}

/// One reported failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The element carrying the directive.
    pub element: NodeId,
    pub tag: String,
    /// The attribute text involved.
    pub expression: String,
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn from_eval(kind: DiagnosticKind, element: NodeId, tag: &str, error: EvalError) -> Self {
        Self {
            kind,
            element,
            tag: tag.to_string(),
            message: error.cause.to_string(),
            expression: error.expression,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failure on <{}> ({}) in `{}`: {}",
            self.kind, self.tag, self.element, self.expression, self.message
        )
    }
}

/// Receives diagnostics from a binder.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Logs each diagnostic with `tracing::error!`. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::error!(
            kind = %diagnostic.kind,
            element = %diagnostic.element,
            tag = %diagnostic.tag,
            expression = %diagnostic.expression,
            "expression evaluation failure: {}",
            diagnostic.message
        );
    }
}

/// Collects diagnostics in memory. Clones share one buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, oldest first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Remove and return everything reported so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}
