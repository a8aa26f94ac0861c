//! Recoverable diagnostics collected during a translation run.
//!
//! The engine never prints directly; every redefinition warning,
//! expression error and missing-include notice lands in the session's
//! `DiagnosticCollector`. The caller decides once, after the run,
//! whether any error-severity entry was recorded and what to do about
//! the output file.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Severity of a recoverable diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Deprecated,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Deprecated => "deprecated",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded diagnostic with its source site.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub path: Option<PathBuf>,
    pub line: u32,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}:", path.display())?;
        }
        write!(f, "{} {}: {}", self.line, self.severity, self.message)
    }
}

/// Accumulates recoverable diagnostics for one translation session.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    entries: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        path: Option<&Path>,
        line: u32,
    ) {
        let diagnostic = Diagnostic {
            severity,
            message: message.into(),
            path: path.map(Path::to_path_buf),
            line,
        };
        log::debug!("{diagnostic}");
        match severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning | Severity::Deprecated => self.warning_count += 1,
        }
        self.entries.push(diagnostic);
    }

    pub fn warning(&mut self, message: impl Into<String>, path: Option<&Path>, line: u32) {
        self.emit(Severity::Warning, message, path, line);
    }

    pub fn deprecated(&mut self, message: impl Into<String>, path: Option<&Path>, line: u32) {
        self.emit(Severity::Deprecated, message, path, line);
    }

    pub fn error(&mut self, message: impl Into<String>, path: Option<&Path>, line: u32) {
        self.emit(Severity::Error, message, path, line);
    }

    /// True when any error-severity diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
