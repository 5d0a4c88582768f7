use crate::document::InlineNode;
use crate::element::Element;
use crate::translate::Translator;
use crate::translate::diagnostics::{self, Result, fail, has_content, required_attr};

/// Tags allowed inside running text.
pub const INLINE_TAGS: [&str; 3] = ["def", "web", "issue"];

pub fn is_inline_tag(element: &Element) -> bool {
    element
        .name()
        .is_some_and(|name| INLINE_TAGS.contains(&name))
}

/// One piece of a paragraph run: raw text or an inline tag.
#[derive(Debug, Clone, Copy)]
pub enum InlineContent<'e> {
    Text(&'e str),
    Element(&'e Element),
}

/// The inline content of an element: its text, then each child followed by
/// the child's tail. Comments are dropped, their tails kept.
pub fn inline_content_of(element: &Element) -> Vec<InlineContent<'_>> {
    let mut content = Vec::new();
    if let Some(text) = &element.text {
        content.push(InlineContent::Text(text));
    }
    for child in &element.children {
        if !child.is_comment() {
            content.push(InlineContent::Element(child));
        }
        if let Some(tail) = &child.tail {
            content.push(InlineContent::Text(tail));
        }
    }
    content
}

/// Paragraph groups under construction. The last group is the open one.
#[derive(Default)]
struct Groups {
    groups: Vec<Vec<InlineNode>>,
}

impl Groups {
    fn current(&mut self) -> &mut Vec<InlineNode> {
        if self.groups.is_empty() {
            self.groups.push(Vec::new());
        }
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    fn start_new(&mut self) {
        self.groups.push(Vec::new());
    }

    /// Append text to the open group, merging with a preceding text item.
    fn push_text(&mut self, text: &str) {
        let group = self.current();
        if text.is_empty() {
            return;
        }
        match group.last_mut() {
            Some(InlineNode::Text(prev)) => prev.push_str(text),
            _ => group.push(InlineNode::text(text)),
        }
    }

    fn push(&mut self, node: InlineNode) {
        self.current().push(node);
    }

    fn finish(self) -> Vec<Vec<InlineNode>> {
        self.groups.into_iter().filter(|g| is_non_empty(g)).collect()
    }
}

/// A group survives if it has several items, or a single item that is an
/// inline tag or text with something besides whitespace.
fn is_non_empty(group: &[InlineNode]) -> bool {
    match group {
        [] => false,
        [InlineNode::Text(text)] => has_content(text),
        _ => true,
    }
}

impl Translator<'_> {
    /// Group inline content into paragraphs.
    ///
    /// With `split_on_blank_lines`, every `"\n\n"` inside a text fragment
    /// starts a new group. Inline tags never split. Groups that end up blank
    /// are dropped; the rest are returned in order, unwrapped.
    pub fn split_paragraphs(
        &mut self,
        content: &[InlineContent<'_>],
        split_on_blank_lines: bool,
    ) -> Result<Vec<Vec<InlineNode>>> {
        let mut groups = Groups::default();

        for item in content {
            match *item {
                InlineContent::Text(text) if split_on_blank_lines => {
                    for (i, segment) in text.split("\n\n").enumerate() {
                        if i > 0 {
                            groups.start_new();
                        }
                        groups.push_text(segment);
                    }
                }
                InlineContent::Text(text) => groups.push_text(text),
                InlineContent::Element(element) => {
                    if let Some(node) = self.translate_inline(element)? {
                        groups.push(node);
                    }
                }
            }
        }

        Ok(groups.finish())
    }

    /// Translate a single inline tag. `None` means the tag was unknown and
    /// has been reported.
    fn translate_inline(&mut self, element: &Element) -> Result<Option<InlineNode>> {
        let node = match element.name() {
            Some("def") => InlineNode::Definition(self.inline_children(element)?),
            Some("web") => {
                let url = required_attr(element, "url")?.to_string();
                let content = self.inline_children(element)?;
                InlineNode::Web { url, content }
            }
            Some("issue") => {
                if !self.inline_children(element)?.is_empty() {
                    return fail(element, "Issue tag should be empty.");
                }
                InlineNode::Issue {
                    id: issue_id(element)?,
                }
            }
            _ => {
                self.report_unknown(element)?;
                return Ok(None);
            }
        };
        Ok(Some(node))
    }

    /// An inline tag's own content, flattened into one sequence.
    fn inline_children(&mut self, element: &Element) -> Result<Vec<InlineNode>> {
        let content = inline_content_of(element);
        let groups = self.split_paragraphs(&content, false)?;
        Ok(groups.into_iter().flatten().collect())
    }
}

fn issue_id(element: &Element) -> diagnostics::Result<i64> {
    let raw = required_attr(element, "id")?;
    match raw.trim().parse::<i64>() {
        Ok(id) => Ok(id),
        Err(_) => fail(
            element,
            format!("Issue id must be an integer, not {:?}.", raw),
        ),
    }
}
