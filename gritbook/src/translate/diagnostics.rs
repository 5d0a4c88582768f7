//! Shape checks shared by the block and paragraph translators. Each check
//! fails with a [`TranslationError`] located at the offending element.

use std::path::Path;

use crate::element::Element;
use crate::translate::error::{ErrorKind, TranslationError};

pub type Result<T> = std::result::Result<T, TranslationError>;

pub fn fail<T>(element: &Element, message: impl Into<String>) -> Result<T> {
    Err(TranslationError::new(
        ErrorKind::Structural,
        &element.location,
        message,
    ))
}

/// True when `text` holds anything besides newlines, tabs and spaces.
pub fn has_content(text: &str) -> bool {
    !text
        .trim_matches(|c: char| matches!(c, '\n' | '\t' | ' '))
        .is_empty()
}

pub fn assert_no_body(element: &Element) -> Result<()> {
    match element.text.as_deref() {
        Some(text) if has_content(text) => fail(
            element,
            format!("Cannot have text inside element {}.", element.display_name()),
        ),
        _ => Ok(()),
    }
}

pub fn assert_no_tail(element: &Element) -> Result<()> {
    match element.tail.as_deref() {
        Some(tail) if has_content(tail) => fail(
            element,
            format!("Cannot have text after element {}.", element.display_name()),
        ),
        _ => Ok(()),
    }
}

pub fn assert_tag(element: &Element, tag: &str) -> Result<()> {
    if element.name() == Some(tag) {
        Ok(())
    } else {
        fail(
            element,
            format!("Expected {}, not {}.", tag, element.display_name()),
        )
    }
}

pub fn assert_file_exists(element: &Element, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(TranslationError::new(
            ErrorKind::MissingResource,
            &element.location,
            format!("File does not exist: {}", path.display()),
        ))
    }
}

/// Fetch an attribute the markup requires.
pub fn required_attr<'e>(element: &'e Element, key: &str) -> Result<&'e str> {
    match element.get(key) {
        Some(value) => Ok(value),
        None => fail(
            element,
            format!("Element {} requires a {} attribute.", element.display_name(), key),
        ),
    }
}

pub fn unknown_tag(element: &Element) -> TranslationError {
    TranslationError::new(
        ErrorKind::UnknownTag,
        &element.location,
        format!("Unknown tag: {}", element.display_name()),
    )
}
