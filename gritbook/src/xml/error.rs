use thiserror::Error;

/// Errors raised while turning XML text into an [`Element`](crate::element::Element) tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XmlError {
    #[error("{file}:{line}: XML syntax error: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },

    #[error("{file}:{line}: mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        file: String,
        line: usize,
        expected: String,
        found: String,
    },

    #[error("{file}:{line}: element <{name}> is never closed")]
    Unclosed {
        file: String,
        line: usize,
        name: String,
    },

    #[error("{file}: empty document, no root element")]
    EmptyDocument { file: String },

    #[error("{file}:{line}: multiple root elements")]
    MultipleRoots { file: String, line: usize },
}

impl XmlError {
    /// 1-based line the error points at, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            XmlError::Syntax { line, .. }
            | XmlError::MismatchedEndTag { line, .. }
            | XmlError::Unclosed { line, .. }
            | XmlError::MultipleRoots { line, .. } => Some(*line),
            XmlError::EmptyDocument { .. } => None,
        }
    }
}
