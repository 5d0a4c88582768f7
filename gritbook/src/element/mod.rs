use std::fmt;

/// Source position of an element, used to attribute diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    /// 1-based line of the element's start tag.
    pub line: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Location {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Name(String),
    /// An XML comment. Carries no content of its own, only a tail.
    Comment,
}

/// A node of the parsed markup tree, as handed over by the XML loader.
///
/// Text follows the classic element-tree layout: `text` is the content before
/// the first child, and each child's `tail` is the content between that child
/// and the next sibling (or the parent's end tag).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<Element>,
    pub location: Location,
}

impl Element {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Element {
            tag: Tag::Name(name.into()),
            attributes: Vec::new(),
            text: None,
            tail: None,
            children: Vec::new(),
            location,
        }
    }

    pub fn comment(location: Location) -> Self {
        Element {
            tag: Tag::Comment,
            attributes: Vec::new(),
            text: None,
            tail: None,
            children: Vec::new(),
            location,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Tag name, or `None` for comments.
    pub fn name(&self) -> Option<&str> {
        match &self.tag {
            Tag::Name(name) => Some(name),
            Tag::Comment => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.tag, Tag::Comment)
    }

    /// Attribute lookup. The first occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Tag name for messages; comments render as `<!--`.
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or("<!--")
    }
}
