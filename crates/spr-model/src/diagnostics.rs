//! Diagnostics interface
//!
//! Every validation, conflict and I/O failure is reported through a
//! [`DiagnosticsSink`] tied to a source location. Reporting never aborts the
//! build.

use crate::declaration::{AnnotationRef, SourceLocation};
use crate::id::ImplementationId;
use crate::path::ResourcePath;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational note
    Note,
    /// Suspicious but accepted
    Warning,
    /// Registration, resource or artifact dropped
    Error,
}

/// Where a diagnostic points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DiagnosticLocation {
    /// A source declaration
    Declaration {
        /// Declaration identifier
        declaration: ImplementationId,
        /// Source position
        source: SourceLocation,
    },
    /// One attribute of the annotation on a declaration
    Attribute {
        /// Declaration identifier
        declaration: ImplementationId,
        /// Source position
        source: SourceLocation,
        /// Annotation
        annotation: AnnotationRef,
        /// Attribute name
        attribute: String,
    },
    /// A resource path with no single source declaration
    Resource {
        /// Resource path
        path: ResourcePath,
    },
}

impl Display for DiagnosticLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declaration {
                declaration,
                source,
            } => write!(f, "{source} ({declaration})"),
            Self::Attribute {
                declaration,
                source,
                annotation,
                attribute,
            } => write!(f, "{source} ({declaration}, @{annotation}.{attribute})"),
            Self::Resource { path } => write!(f, "{path}"),
        }
    }
}

/// One reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Location, if any
    pub location: Option<DiagnosticLocation>,
}

impl Diagnostic {
    /// Create error diagnostic
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location: None,
        }
    }

    /// Attach location
    #[inline]
    #[must_use]
    pub fn at(mut self, location: DiagnosticLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Check if this is an error
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.location {
            Some(location) => write!(f, "{level}: {location}: {}", self.message),
            None => write!(f, "{level}: {}", self.message),
        }
    }
}

/// Receiver of diagnostics
pub trait DiagnosticsSink: Send + Sync + Debug {
    /// Report one diagnostic
    fn report(&self, diagnostic: Diagnostic);
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for Arc<S> {
    fn report(&self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Sink forwarding to `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        let location = diagnostic
            .location
            .as_ref()
            .map(|location| format!("{location}: "))
            .unwrap_or_default();
        match diagnostic.severity {
            Severity::Error => tracing::error!("{}{}", location, diagnostic.message),
            Severity::Warning => tracing::warn!("{}{}", location, diagnostic.message),
            Severity::Note => tracing::info!("{}{}", location, diagnostic.message),
        }
    }
}

/// Sink recording every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    inner: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Create empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of reported diagnostics
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.lock().clone()
    }

    /// Number of error diagnostics
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.inner.lock().iter().filter(|d| d.is_error()).count()
    }

    /// Check if any reported message contains `needle`
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.inner.lock().iter().any(|d| d.message.contains(needle))
    }

    /// Take and clear reported diagnostics
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.inner.lock())
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.inner.lock().push(diagnostic);
    }
}

/// Sink forwarding to several sinks
#[derive(Debug, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn DiagnosticsSink>>,
}

impl FanoutSink {
    /// Create empty fan-out
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a downstream sink
    #[inline]
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl DiagnosticsSink for FanoutSink {
    fn report(&self, diagnostic: Diagnostic) {
        for sink in &self.sinks {
            sink.report(diagnostic.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_records() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic::error("x.Impl must be public"));
        assert_eq!(sink.error_count(), 1);
        assert!(sink.contains("must be public"));
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let a = Arc::new(CollectingSink::new());
        let b = Arc::new(CollectingSink::new());
        let fan = FanoutSink::new().with(a.clone()).with(b.clone());
        fan.report(Diagnostic::error("boom"));
        assert_eq!(a.error_count(), 1);
        assert_eq!(b.error_count(), 1);
    }

    #[test]
    fn display_with_location() {
        let path: ResourcePath = "META-INF/services/x.Y".parse().unwrap();
        let diag = Diagnostic::error("cannot write").at(DiagnosticLocation::Resource { path });
        assert_eq!(diag.to_string(), "error: META-INF/services/x.Y: cannot write");
    }
}
