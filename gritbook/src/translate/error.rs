use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::Files;
use thiserror::Error;

use crate::element::Location;

/// What went wrong, following the book's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Text, tags or attributes where the markup does not allow them.
    Structural,
    /// An image or thumbnail file is missing.
    MissingResource,
    /// A tag outside the recognised vocabulary. Reported, not fatal, unless
    /// translating in strict mode.
    UnknownTag,
}

/// A translation problem attributed to a source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}:{line}: {message}")]
pub struct TranslationError {
    pub kind: ErrorKind,
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl TranslationError {
    pub fn new(kind: ErrorKind, location: &Location, message: impl Into<String>) -> Self {
        TranslationError {
            kind,
            file: location.file.clone(),
            line: location.line,
            message: message.into(),
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.file.clone(), self.line)
    }

    /// Convert to a codespan-reporting Diagnostic for display. The label
    /// covers the whole offending line when `files` knows it.
    pub fn to_diagnostic<'a, F>(&self, severity: Severity, file_id: usize, files: &'a F) -> Diagnostic<usize>
    where
        F: Files<'a, FileId = usize>,
    {
        let labels = match files.line_range(file_id, self.line.saturating_sub(1)) {
            Ok(range) => vec![Label::primary(file_id, range)],
            Err(_) => Vec::new(),
        };
        Diagnostic::new(severity)
            .with_message(&self.message)
            .with_labels(labels)
    }
}
