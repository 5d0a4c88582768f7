//! Loads book XML into the [`Element`] tree consumed by the translator.

pub mod error;

pub use error::XmlError;

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::element::{Element, Location};

/// Parse XML source text. `file` is only used to label locations.
pub fn parse_str(source: &str, file: &str) -> Result<Element, XmlError> {
    let source = normalize_line_endings(source);
    let mut loader = Loader::new(&source, file);
    loader.run()
}

/// `\r\n` and lone `\r` become `\n`, as XML requires of a processor.
/// Runs before entity expansion, so `&#13;` still yields a carriage return.
fn normalize_line_endings(source: &str) -> Cow<'_, str> {
    if source.contains('\r') {
        Cow::Owned(source.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(source)
    }
}

/// Maps byte offsets to 1-based line numbers.
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { line_starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }
}

struct Loader<'a> {
    reader: Reader<&'a [u8]>,
    file: &'a str,
    lines: LineIndex,
    /// Open elements, innermost last.
    stack: Vec<Element>,
    root: Option<Element>,
}

impl<'a> Loader<'a> {
    fn new(source: &'a str, file: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        // End tags are matched against our own stack for a located error.
        reader.config_mut().check_end_names = false;

        Loader {
            reader,
            file,
            lines: LineIndex::new(source),
            stack: Vec::new(),
            root: None,
        }
    }

    fn run(&mut self) -> Result<Element, XmlError> {
        loop {
            let event_start = self.reader.buffer_position() as usize;
            let location = self.location(event_start);

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let element = self.open(&e, location)?;
                    self.stack.push(element);
                }
                Ok(Event::End(e)) => {
                    let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let Some(element) = self.stack.pop() else {
                        return Err(self.syntax(location.line, format!("unexpected </{}>", found)));
                    };
                    if element.name() != Some(found.as_str()) {
                        return Err(XmlError::MismatchedEndTag {
                            file: self.file.to_string(),
                            line: location.line,
                            expected: element.display_name().to_string(),
                            found,
                        });
                    }
                    self.close(element)?;
                }
                Ok(Event::Empty(e)) => {
                    let element = self.open(&e, location)?;
                    self.close(element)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|err| self.syntax(location.line, err.to_string()))?;
                    self.push_text(&text);
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    self.push_text(&text);
                }
                Ok(Event::Comment(_)) => {
                    if let Some(parent) = self.stack.last_mut() {
                        parent.children.push(Element::comment(location));
                    }
                }
                Ok(Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(err) => {
                    let line = self.lines.line_of(self.reader.error_position() as usize);
                    return Err(self.syntax(line, err.to_string()));
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(XmlError::Unclosed {
                file: self.file.to_string(),
                line: open.location.line,
                name: open.display_name().to_string(),
            });
        }

        self.root.take().ok_or_else(|| XmlError::EmptyDocument {
            file: self.file.to_string(),
        })
    }

    fn open(&self, e: &BytesStart<'_>, location: Location) -> Result<Element, XmlError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut element = Element::new(name, location);

        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.syntax(element.location.line, err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| self.syntax(element.location.line, err.to_string()))?;
            element.attributes.push((key, value.into_owned()));
        }

        Ok(element)
    }

    /// Attach a finished element to its parent, or make it the root.
    fn close(&mut self, element: Element) -> Result<(), XmlError> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(element);
            return Ok(());
        }
        if self.root.is_some() {
            return Err(XmlError::MultipleRoots {
                file: self.file.to_string(),
                line: element.location.line,
            });
        }
        self.root = Some(element);
        Ok(())
    }

    /// Text goes to the open element's `text` until it has a child, then to
    /// the last child's `tail`. Text outside the root is dropped.
    fn push_text(&mut self, text: &str) {
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        let slot = match parent.children.last_mut() {
            Some(child) => &mut child.tail,
            None => &mut parent.text,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn location(&self, offset: usize) -> Location {
        Location::new(self.file, self.lines.line_of(offset))
    }

    fn syntax(&self, line: usize, message: String) -> XmlError {
        XmlError::Syntax {
            file: self.file.to_string(),
            line,
            message,
        }
    }
}
