use std::path::Path;

use crate::document::{BlockNode, Document};
use crate::element::Element;
use crate::translate::Translator;
use crate::translate::dedent::dedent;
use crate::translate::diagnostics::{
    Result, assert_file_exists, assert_no_body, assert_no_tail, assert_tag, required_attr,
};
use crate::translate::paragraphs::{InlineContent, is_inline_tag};

impl Translator<'_> {
    /// Translate the children of a container (the book root, a section or a
    /// list item) into block nodes, in document order.
    ///
    /// Text and inline tags accumulate into a paragraph run. A comment with
    /// a tail ends the run and its tail begins a new one. Any other child
    /// flushes the run into paragraphs, is translated as a block, and its
    /// tail begins the next run.
    pub fn translate_blocks(&mut self, container: &Element) -> Result<Document> {
        let mut nodes = Vec::new();
        let mut run: Vec<InlineContent<'_>> = Vec::new();

        if let Some(text) = &container.text {
            run.push(InlineContent::Text(text));
        }

        for child in &container.children {
            if child.is_comment() {
                if child.tail.as_deref().is_some_and(|tail| !tail.is_empty()) {
                    self.flush_run(&mut run, &mut nodes)?;
                }
            } else if is_inline_tag(child) {
                run.push(InlineContent::Element(child));
            } else {
                self.flush_run(&mut run, &mut nodes)?;
                if let Some(node) = self.translate_block(child)? {
                    nodes.push(node);
                }
            }
            if let Some(tail) = &child.tail {
                run.push(InlineContent::Text(tail));
            }
        }
        self.flush_run(&mut run, &mut nodes)?;

        Ok(Document { nodes })
    }

    fn flush_run(
        &mut self,
        run: &mut Vec<InlineContent<'_>>,
        nodes: &mut Vec<BlockNode>,
    ) -> Result<()> {
        if run.is_empty() {
            return Ok(());
        }
        let groups = self.split_paragraphs(run, true)?;
        nodes.extend(groups.into_iter().map(BlockNode::Paragraph));
        run.clear();
        Ok(())
    }

    /// Translate one block element. `None` means the tag was unknown and
    /// has been reported.
    fn translate_block(&mut self, element: &Element) -> Result<Option<BlockNode>> {
        let node = match element.name() {
            Some("section") => self.translate_section(element)?,
            Some("image") => self.translate_image(element)?,
            Some("ul") => self.translate_list(element)?,
            Some("lua") => BlockNode::Lua(dedent(element.text.as_deref().unwrap_or(""))),
            Some("pre") => BlockNode::Preformatted(dedent(element.text.as_deref().unwrap_or(""))),
            _ => {
                self.report_unknown(element)?;
                return Ok(None);
            }
        };
        Ok(Some(node))
    }

    fn translate_section(&mut self, element: &Element) -> Result<BlockNode> {
        let id = element.get("id").map(str::to_string);
        tracing::debug!(location = %element.location, id = ?id, "section");

        let content = self.translate_blocks(element)?;
        let split = element.get("splitbelow") == Some("true");
        assert_no_tail(element)?;

        Ok(BlockNode::Section {
            id,
            title: element.get("title").map(str::to_string),
            split,
            content,
        })
    }

    fn translate_image(&mut self, element: &Element) -> Result<BlockNode> {
        assert_no_body(element)?;
        let src = required_attr(element, "src")?;
        let thumb_src = thumbnail_path(src, &self.options.thumbnail_prefix);
        assert_file_exists(element, &self.options.base_dir.join(src))?;
        assert_file_exists(element, &self.options.base_dir.join(&thumb_src))?;

        Ok(BlockNode::Image {
            src: src.to_string(),
            thumb_src,
            caption: element.get("caption").map(str::to_string),
            title: element.get("title").map(str::to_string),
        })
    }

    fn translate_list(&mut self, element: &Element) -> Result<BlockNode> {
        assert_no_body(element)?;

        let mut items = Vec::new();
        for item in &element.children {
            assert_tag(item, "li")?;
            items.push(self.translate_blocks(item)?);
            assert_no_tail(item)?;
        }

        Ok(BlockNode::UnorderedList { items })
    }
}

/// `img/pic.png` becomes `img/<prefix>pic.png`.
pub fn thumbnail_path(src: &str, prefix: &str) -> String {
    let path = Path::new(src);
    match path.file_name() {
        Some(name) => path
            .with_file_name(format!("{}{}", prefix, name.to_string_lossy()))
            .to_string_lossy()
            .into_owned(),
        None => format!("{}{}", prefix, src),
    }
}
