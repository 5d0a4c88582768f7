pub mod document;
pub mod element;
pub mod translate;
pub mod xml;

pub use document::{BlockNode, Document, InlineNode};
pub use element::{Element, Location, Tag};
pub use translate::{ErrorKind, Options, TranslationError, Translator, translate};
pub use xml::XmlError;

use thiserror::Error;

/// Anything that can stop a book from loading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
}

/// Parse XML source and translate it in one go.
pub fn load_str(
    source: &str,
    file: &str,
    options: &Options,
) -> Result<(Document, Vec<TranslationError>), Error> {
    let root = xml::parse_str(source, file)?;
    Ok(translate(&root, options)?)
}
