//! Translation of book markup into a typed [`Document`].
//!
//! Two mutually recursive walks do the work: the block walk in [`blocks`]
//! partitions a container's children into paragraph runs and block elements,
//! and the paragraph splitter in [`paragraphs`] cuts runs into paragraphs at
//! blank lines and translates the inline tags inside them.

pub mod blocks;
pub mod dedent;
pub mod diagnostics;
pub mod error;
pub mod paragraphs;

pub use error::{ErrorKind, TranslationError};

use std::path::PathBuf;

use crate::document::Document;
use crate::element::Element;

pub const THUMBNAIL_PREFIX: &str = "thumb_";

/// Knobs for a translation run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory image paths are resolved against for the existence checks.
    /// Empty means the paths are used as written.
    pub base_dir: PathBuf,
    /// Prepended to an image's file name to find its thumbnail.
    pub thumbnail_prefix: String,
    /// Treat unknown tags as fatal instead of reporting and skipping them.
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            base_dir: PathBuf::new(),
            thumbnail_prefix: THUMBNAIL_PREFIX.to_string(),
            strict: false,
        }
    }
}

/// Translation state scoped to one document. Holds the options and the
/// warnings collected so far; everything else lives in the recursive calls.
pub struct Translator<'o> {
    options: &'o Options,
    warnings: Vec<TranslationError>,
}

impl<'o> Translator<'o> {
    pub fn new(options: &'o Options) -> Self {
        Translator {
            options,
            warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> &Options {
        self.options
    }

    /// Non-fatal problems reported so far.
    pub fn warnings(&self) -> &[TranslationError] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<TranslationError> {
        self.warnings
    }

    /// Record an unknown tag. Fatal only in strict mode.
    fn report_unknown(&mut self, element: &Element) -> diagnostics::Result<()> {
        let error = diagnostics::unknown_tag(element);
        if self.options.strict {
            return Err(error);
        }
        tracing::warn!(location = %element.location, tag = element.display_name(), "unknown tag skipped");
        self.warnings.push(error);
        Ok(())
    }
}

/// Translate the children of `root` into a document.
///
/// Returns the tree together with the non-fatal warnings, or the first fatal
/// error. A failed translation yields no partial tree.
pub fn translate(
    root: &Element,
    options: &Options,
) -> Result<(Document, Vec<TranslationError>), TranslationError> {
    tracing::debug!(file = %root.location.file, "translating book");
    let mut translator = Translator::new(options);
    let document = translator.translate_blocks(root)?;
    tracing::debug!(
        nodes = document.len(),
        warnings = translator.warnings().len(),
        "translation finished"
    );
    Ok((document, translator.into_warnings()))
}
