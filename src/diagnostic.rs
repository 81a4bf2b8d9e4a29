//! Diagnostics - Structured problem reports
//!
//! Every problem found while building the scope tree or composing a scope
//! is reported as a `{kind, severity, directory, detail}` record. Records are
//! collected rather than raised so one run surfaces every misconfiguration.

use crate::path::ScopePath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A declaration (or the parent it references) does not resolve inside the scanned tree
    MalformedScope,
    /// Equally specific declarations compete for one directory
    ConflictingScope,
    /// The requested mode gates away every include with no ungated fallback
    LanguageGateConflict,
    /// A declared include is not a well-formed header path
    MalformedInclude,
    /// An inheriting scope re-declares an include its ancestors already supply
    RedundantInclude,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedScope => "malformed-scope",
            DiagnosticKind::ConflictingScope => "conflicting-scope",
            DiagnosticKind::LanguageGateConflict => "language-gate-conflict",
            DiagnosticKind::MalformedInclude => "malformed-include",
            DiagnosticKind::RedundantInclude => "redundant-include",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Directory the problem is scoped to
    pub directory: ScopePath,
    pub detail: String,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, directory: ScopePath, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            directory,
            detail: detail.into(),
        }
    }

    pub fn warning(kind: DiagnosticKind, directory: ScopePath, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            directory,
            detail: detail.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity.as_str(),
            self.kind.as_str(),
            self.directory,
            self.detail
        )
    }
}
