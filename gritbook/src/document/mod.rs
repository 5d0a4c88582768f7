use std::fmt;

/// An ordered sequence of block nodes: a whole book, a section's body or
/// a single list item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub nodes: Vec<BlockNode>,
}

impl Document {
    pub fn empty() -> Self {
        Document { nodes: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlockNode> {
        self.nodes.iter()
    }
}

impl From<Vec<BlockNode>> for Document {
    fn from(nodes: Vec<BlockNode>) -> Self {
        Document { nodes }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a BlockNode;
    type IntoIter = std::slice::Iter<'a, BlockNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl IntoIterator for Document {
    type Item = BlockNode;
    type IntoIter = std::vec::IntoIter<BlockNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

/// Structural content of a book.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockNode {
    /// Never empty: blank runs of text produce no paragraph at all.
    Paragraph(Vec<InlineNode>),
    Section {
        id: Option<String>,
        title: Option<String>,
        /// Set only by `splitbelow="true"`.
        split: bool,
        content: Document,
    },
    Image {
        src: String,
        thumb_src: String,
        caption: Option<String>,
        title: Option<String>,
    },
    UnorderedList {
        items: Vec<Document>,
    },
    /// Dedented Lua source.
    Lua(String),
    /// Dedented preformatted text.
    Preformatted(String),
}

/// Content that lives inside running text.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineNode {
    Text(String),
    Definition(Vec<InlineNode>),
    Web { url: String, content: Vec<InlineNode> },
    Issue { id: i64 },
}

impl InlineNode {
    pub fn text(s: impl Into<String>) -> Self {
        InlineNode::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            InlineNode::Text(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Outline rendering
// ---------------------------------------------------------------------------

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        write!(f, "  ")?;
    }
    Ok(())
}

fn write_document(f: &mut fmt::Formatter<'_>, doc: &Document, depth: usize) -> fmt::Result {
    for node in &doc.nodes {
        write_block(f, node, depth)?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, node: &BlockNode, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match node {
        BlockNode::Paragraph(inlines) => {
            writeln!(f, "Paragraph")?;
            write_inlines(f, inlines, depth + 1)
        }
        BlockNode::Section {
            id,
            title,
            split,
            content,
        } => {
            write!(f, "Section")?;
            if let Some(id) = id {
                write!(f, " id={:?}", id)?;
            }
            if let Some(title) = title {
                write!(f, " title={:?}", title)?;
            }
            if *split {
                write!(f, " split")?;
            }
            writeln!(f)?;
            write_document(f, content, depth + 1)
        }
        BlockNode::Image {
            src,
            thumb_src,
            caption,
            title,
        } => {
            write!(f, "Image src={:?} thumb_src={:?}", src, thumb_src)?;
            if let Some(caption) = caption {
                write!(f, " caption={:?}", caption)?;
            }
            if let Some(title) = title {
                write!(f, " title={:?}", title)?;
            }
            writeln!(f)
        }
        BlockNode::UnorderedList { items } => {
            writeln!(f, "UnorderedList")?;
            for item in items {
                indent(f, depth + 1)?;
                writeln!(f, "Item")?;
                write_document(f, item, depth + 2)?;
            }
            Ok(())
        }
        BlockNode::Lua(code) => writeln!(f, "Lua {:?}", code),
        BlockNode::Preformatted(text) => writeln!(f, "Preformatted {:?}", text),
    }
}

fn write_inlines(f: &mut fmt::Formatter<'_>, inlines: &[InlineNode], depth: usize) -> fmt::Result {
    for inline in inlines {
        indent(f, depth)?;
        match inline {
            InlineNode::Text(s) => writeln!(f, "Text {:?}", s)?,
            InlineNode::Definition(content) => {
                writeln!(f, "Definition")?;
                write_inlines(f, content, depth + 1)?;
            }
            InlineNode::Web { url, content } => {
                writeln!(f, "Web {:?}", url)?;
                write_inlines(f, content, depth + 1)?;
            }
            InlineNode::Issue { id } => writeln!(f, "Issue {}", id)?,
        }
    }
    Ok(())
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_document(f, self, 0)
    }
}

impl fmt::Display for BlockNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(f, self, 0)
    }
}

impl fmt::Display for InlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_inlines(f, std::slice::from_ref(self), 0)
    }
}
