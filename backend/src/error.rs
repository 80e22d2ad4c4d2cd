// src/error.rs
use std::fmt;
use std::io;
use std::path::PathBuf;

use log::{debug, warn};
use thiserror::Error;

use crate::record::RecordId;

/// Caller-level failures. Anything that goes wrong with a single line or a
/// single input path is a [`Diagnostic`] instead.
#[derive(Debug, Error)]
pub enum TriviaError {
    #[error("no question files or paths were supplied")]
    NoPaths,
    #[error("invalid path '{path}': {source}")]
    InvalidPath { path: String, source: io::Error },
    #[error("invalid bind address provided: {0}")]
    InvalidBind(String),
    #[error("invalid reload interval '{0}' (expected e.g. \"30s\", \"5m\" or \"1h30m\")")]
    InvalidInterval(String),
    #[error("cookie secret rejected by the signer")]
    InvalidSecret,
}

/// A recoverable problem found while building a snapshot.
#[derive(Debug)]
pub enum Diagnostic {
    Malformed {
        path: PathBuf,
        line: usize,
        fields: usize,
    },
    Duplicate {
        path: PathBuf,
        line: usize,
        id: RecordId,
    },
    Unreadable {
        path: PathBuf,
        source: io::Error,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Malformed { path, line, fields } => write!(
                f,
                "Skipped invalid entry at {}:{} ({} fields)",
                path.display(),
                line,
                fields
            ),
            Diagnostic::Duplicate { path, line, id } => write!(
                f,
                "Skipped duplicate entry at {}:{} ({})",
                path.display(),
                line,
                id
            ),
            Diagnostic::Unreadable { path, source } => {
                write!(f, "Could not read {}: {}", path.display(), source)
            }
        }
    }
}

/// Receives diagnostics as a load progresses.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards diagnostics to the log and keeps a count of what it saw.
#[derive(Debug, Default)]
pub struct LogSink {
    pub reported: usize,
}

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.reported += 1;
        match diagnostic {
            Diagnostic::Unreadable { .. } => warn!("{}", diagnostic),
            _ => debug!("{}", diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_name_the_bad_input() {
        assert_eq!(
            TriviaError::InvalidInterval("5x".into()).to_string(),
            "invalid reload interval '5x' (expected e.g. \"30s\", \"5m\" or \"1h30m\")"
        );
        assert_eq!(
            TriviaError::InvalidSecret.to_string(),
            "cookie secret rejected by the signer"
        );
    }

    #[test]
    fn vec_sink_keeps_diagnostics_in_order() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.report(Diagnostic::Malformed { path: "a".into(), line: 1, fields: 4 });
        sink.report(Diagnostic::Duplicate {
            path: "a".into(),
            line: 2,
            id: RecordId::from(RecordId::NIL),
        });
        assert_eq!(sink[0].to_string(), "Skipped invalid entry at a:1 (4 fields)");
        assert!(matches!(sink[1], Diagnostic::Duplicate { line: 2, .. }));
    }
}
