use std::fs;

use gritbook::{
    BlockNode, Document, Element, Error, ErrorKind, InlineNode, Location, Options,
    TranslationError,
};

fn run_with(source: &str, options: &Options) -> (Document, Vec<TranslationError>) {
    gritbook::load_str(source, "book.xml", options).expect("translation failed")
}

fn run(source: &str) -> Document {
    let (doc, warnings) = run_with(source, &Options::default());
    assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    doc
}

fn run_err(source: &str) -> TranslationError {
    match gritbook::load_str(source, "book.xml", &Options::default()) {
        Err(Error::Translation(err)) => err,
        Err(other) => panic!("expected a translation error, got {}", other),
        Ok((doc, _)) => panic!("expected an error, got:\n{}", doc),
    }
}

fn text(s: &str) -> InlineNode {
    InlineNode::text(s)
}

fn para(items: Vec<InlineNode>) -> BlockNode {
    BlockNode::Paragraph(items)
}

// ---------------------------------------------------------------------------
// Paragraph splitting
// ---------------------------------------------------------------------------

#[test]
fn blank_line_splits_paragraphs() {
    let doc = run("<book>A\n\nB</book>");
    assert_eq!(doc.nodes, vec![para(vec![text("A")]), para(vec![text("B")])]);
}

#[test]
fn trailing_blank_segments_are_dropped() {
    let doc = run("<book>A\n\n\n\n</book>");
    assert_eq!(doc.nodes, vec![para(vec![text("A")])]);
}

#[test]
fn three_newlines_leave_one_in_the_next_paragraph() {
    let doc = run("<book>A\n\n\nB</book>");
    assert_eq!(doc.nodes, vec![para(vec![text("A")]), para(vec![text("\nB")])]);
}

#[test]
fn four_newlines_drop_the_empty_middle_paragraph() {
    let doc = run("<book>A\n\n\n\nB</book>");
    assert_eq!(doc.nodes, vec![para(vec![text("A")]), para(vec![text("B")])]);
}

#[test]
fn whitespace_only_text_yields_nothing() {
    let doc = run("<book>\n  \n\n \t \n</book>");
    assert!(doc.is_empty());
}

#[test]
fn paragraph_run_spans_inline_tags() {
    let doc = run("<book>one\n\ntwo <def>x</def> three\n\nfour</book>");
    assert_eq!(
        doc.nodes,
        vec![
            para(vec![text("one")]),
            para(vec![
                text("two "),
                InlineNode::Definition(vec![text("x")]),
                text(" three"),
            ]),
            para(vec![text("four")]),
        ]
    );
}

#[test]
fn inline_tags_never_split_on_blank_lines() {
    let doc = run("<book><def>a\n\nb</def></book>");
    assert_eq!(
        doc.nodes,
        vec![para(vec![InlineNode::Definition(vec![text("a\n\nb")])])]
    );
}

#[test]
fn lone_inline_tag_is_a_paragraph() {
    let doc = run("<book>\n  <issue id=\"7\"/>\n</book>");
    assert_eq!(
        doc.nodes,
        vec![para(vec![text("\n  "), InlineNode::Issue { id: 7 }, text("\n")])]
    );
}

#[test]
fn comment_tail_starts_a_new_paragraph() {
    let doc = run("<book>Before<!-- c -->after</book>");
    assert_eq!(
        doc.nodes,
        vec![para(vec![text("Before")]), para(vec![text("after")])]
    );
}

#[test]
fn comment_without_tail_keeps_the_run_open() {
    let doc = run("<book>See<!-- c --><issue id=\"4\"/></book>");
    assert_eq!(
        doc.nodes,
        vec![para(vec![text("See"), InlineNode::Issue { id: 4 }])]
    );
}

#[test]
fn crlf_blank_lines_split_paragraphs() {
    let doc = run("<book>A\r\n\r\nB\rC</book>");
    assert_eq!(
        doc.nodes,
        vec![para(vec![text("A")]), para(vec![text("B\nC")])]
    );
}

// ---------------------------------------------------------------------------
// Inline tags
// ---------------------------------------------------------------------------

#[test]
fn web_tag() {
    let doc = run("<book><web url=\"http://x\">hello</web></book>");
    assert_eq!(
        doc.nodes,
        vec![para(vec![InlineNode::Web {
            url: "http://x".to_string(),
            content: vec![text("hello")],
        }])]
    );
}

#[test]
fn web_requires_url() {
    let err = run_err("<book><web>hello</web></book>");
    assert_eq!(err.kind, ErrorKind::Structural);
    assert!(err.message.contains("url"), "{}", err);
}

#[test]
fn issue_tag() {
    let doc = run("<book>See <issue id=\"42\"/>.</book>");
    assert_eq!(
        doc.nodes,
        vec![para(vec![text("See "), InlineNode::Issue { id: 42 }, text(".")])]
    );
}

#[test]
fn issue_with_only_whitespace_is_empty() {
    let doc = run("<book><issue id=\"3\"> </issue></book>");
    assert_eq!(doc.nodes, vec![para(vec![InlineNode::Issue { id: 3 }])]);
}

#[test]
fn carriage_return_counts_as_issue_content() {
    let err = run_err("<book><issue id=\"1\">&#13;</issue></book>");
    assert_eq!(err.message, "Issue tag should be empty.");
}

#[test]
fn negative_issue_id() {
    let doc = run("<book><issue id=\"-3\"/></book>");
    assert_eq!(doc.nodes, vec![para(vec![InlineNode::Issue { id: -3 }])]);
}

#[test]
fn issue_with_content_fails() {
    let err = run_err("<book><issue id=\"1\">oops</issue></book>");
    assert_eq!(err.kind, ErrorKind::Structural);
    assert_eq!(err.to_string(), "book.xml:1: Issue tag should be empty.");
}

#[test]
fn issue_id_must_be_an_integer() {
    let err = run_err("<book><issue id=\"abc\"/></book>");
    assert_eq!(err.kind, ErrorKind::Structural);

    let err = run_err("<book><issue/></book>");
    assert_eq!(err.kind, ErrorKind::Structural);
}

#[test]
fn nested_inline_tags() {
    let doc = run("<book>A <def>term <web url=\"u\">link</web> tail</def> end</book>");
    assert_eq!(
        doc.nodes,
        vec![para(vec![
            text("A "),
            InlineNode::Definition(vec![
                text("term "),
                InlineNode::Web {
                    url: "u".to_string(),
                    content: vec![text("link")],
                },
                text(" tail"),
            ]),
            text(" end"),
        ])]
    );
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

#[test]
fn blocks_interrupt_paragraphs() {
    let doc = run("<book>before<pre>x</pre>after</book>");
    assert_eq!(
        doc.nodes,
        vec![
            para(vec![text("before")]),
            BlockNode::Preformatted("x".to_string()),
            para(vec![text("after")]),
        ]
    );
}

#[test]
fn nested_sections_mirror_input() {
    let source = "<book>
  <section id=\"a\" title=\"A\">
    Intro
    <section id=\"b\" title=\"B\" splitbelow=\"true\">Deep</section>
  </section>
  <section id=\"c\" title=\"C\" splitbelow=\"yes\"/>
</book>";
    let doc = run(source);
    assert_eq!(doc.len(), 2);

    let BlockNode::Section {
        id,
        title,
        split,
        content,
    } = &doc.nodes[0]
    else {
        panic!("expected a section, got {:?}", doc.nodes[0]);
    };
    assert_eq!(id.as_deref(), Some("a"));
    assert_eq!(title.as_deref(), Some("A"));
    assert!(!split);
    assert_eq!(content.len(), 2);
    assert_eq!(content.nodes[0], para(vec![text("\n    Intro\n    ")]));
    assert_eq!(
        content.nodes[1],
        BlockNode::Section {
            id: Some("b".to_string()),
            title: Some("B".to_string()),
            split: true,
            content: Document::from(vec![para(vec![text("Deep")])]),
        }
    );

    assert_eq!(
        doc.nodes[1],
        BlockNode::Section {
            id: Some("c".to_string()),
            title: Some("C".to_string()),
            split: false,
            content: Document::empty(),
        }
    );
}

#[test]
fn text_after_section_fails() {
    let err = run_err("<book><section id=\"a\">x</section>stray</book>");
    assert_eq!(err.kind, ErrorKind::Structural);
    assert_eq!(err.message, "Cannot have text after element section.");
}

#[test]
fn unordered_list() {
    let doc = run("<book><ul><li>one</li><li>two<ul><li>nested</li></ul></li></ul></book>");
    assert_eq!(
        doc.nodes,
        vec![BlockNode::UnorderedList {
            items: vec![
                Document::from(vec![para(vec![text("one")])]),
                Document::from(vec![
                    para(vec![text("two")]),
                    BlockNode::UnorderedList {
                        items: vec![Document::from(vec![para(vec![text("nested")])])],
                    },
                ]),
            ],
        }]
    );
}

#[test]
fn list_children_must_be_items() {
    let err = run_err("<book>\n<ul>\n<li>a</li>\n<p>b</p>\n</ul>\n</book>");
    assert_eq!(err.kind, ErrorKind::Structural);
    assert_eq!(err.to_string(), "book.xml:4: Expected li, not p.");
}

#[test]
fn list_cannot_hold_text() {
    let err = run_err("<book><ul>text<li>a</li></ul></book>");
    assert_eq!(err.kind, ErrorKind::Structural);
    assert_eq!(err.message, "Cannot have text inside element ul.");
}

#[test]
fn list_item_cannot_have_tail() {
    let err = run_err("<book><ul><li>a</li>stray</ul></book>");
    assert_eq!(err.message, "Cannot have text after element li.");
}

#[test]
fn comments_inside_lists_fail() {
    let err = run_err("<book><ul>\n  <!-- first -->\n  <li>a</li>\n</ul></book>");
    assert_eq!(err.kind, ErrorKind::Structural);
    assert_eq!(err.line, 2);
    assert_eq!(err.message, "Expected li, not <!--.");
}

#[test]
fn crlf_code_blocks_are_dedented() {
    let doc = run("<book><pre>\r\n    a\r\n      b\r\n</pre></book>");
    assert_eq!(
        doc.nodes,
        vec![BlockNode::Preformatted("\na\n  b\n".to_string())]
    );
}

#[test]
fn lua_and_pre_are_dedented() {
    let source = "<book><lua>\n    local x = 1\n    if x then\n        y()\n    end\n  </lua><pre>\n  a\n\tb\n</pre></book>";
    let doc = run(source);
    assert_eq!(
        doc.nodes,
        vec![
            BlockNode::Lua("\nlocal x = 1\nif x then\n    y()\nend\n".to_string()),
            BlockNode::Preformatted("\n  a\n\tb\n".to_string()),
        ]
    );
}

#[test]
fn empty_code_block() {
    let doc = run("<book><lua/></book>");
    assert_eq!(doc.nodes, vec![BlockNode::Lua(String::new())]);
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

fn image_dir(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    for file in files {
        let path = dir.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"png").unwrap();
    }
    dir
}

fn options_in(dir: &tempfile::TempDir) -> Options {
    Options {
        base_dir: dir.path().to_path_buf(),
        ..Options::default()
    }
}

#[test]
fn image_with_thumbnail() {
    let dir = image_dir(&["pic.png", "thumb_pic.png"]);
    let (doc, _) = run_with(
        "<book><image src=\"pic.png\" caption=\"A picture\"/></book>",
        &options_in(&dir),
    );
    assert_eq!(
        doc.nodes,
        vec![BlockNode::Image {
            src: "pic.png".to_string(),
            thumb_src: "thumb_pic.png".to_string(),
            caption: Some("A picture".to_string()),
            title: None,
        }]
    );
}

#[test]
fn thumbnail_lives_next_to_image() {
    let dir = image_dir(&["img/pic.png", "img/thumb_pic.png"]);
    let (doc, _) = run_with("<book><image src=\"img/pic.png\"/></book>", &options_in(&dir));
    let BlockNode::Image { thumb_src, .. } = &doc.nodes[0] else {
        panic!("expected an image");
    };
    assert_eq!(thumb_src, "img/thumb_pic.png");
}

#[test]
fn missing_thumbnail_fails() {
    let dir = image_dir(&["pic.png"]);
    let err = gritbook::load_str(
        "<book><image src=\"pic.png\"/></book>",
        "book.xml",
        &options_in(&dir),
    )
    .unwrap_err();
    let Error::Translation(err) = err else {
        panic!("expected a translation error");
    };
    assert_eq!(err.kind, ErrorKind::MissingResource);
    assert!(err.message.contains("thumb_pic.png"), "{}", err);
}

#[test]
fn missing_image_fails() {
    let dir = image_dir(&["thumb_pic.png"]);
    let err = gritbook::load_str(
        "<book><image src=\"pic.png\"/></book>",
        "book.xml",
        &options_in(&dir),
    )
    .unwrap_err();
    let Error::Translation(err) = err else {
        panic!("expected a translation error");
    };
    assert_eq!(err.kind, ErrorKind::MissingResource);
    assert!(err.message.starts_with("File does not exist: "), "{}", err);
    assert!(!err.message.contains("thumb_"), "{}", err);
}

#[test]
fn image_with_text_fails() {
    let dir = image_dir(&["pic.png", "thumb_pic.png"]);
    let err = gritbook::load_str(
        "<book><image src=\"pic.png\">caption?</image></book>",
        "book.xml",
        &options_in(&dir),
    )
    .unwrap_err();
    let Error::Translation(err) = err else {
        panic!("expected a translation error");
    };
    assert_eq!(err.kind, ErrorKind::Structural);
    assert_eq!(err.message, "Cannot have text inside element image.");
}

#[test]
fn custom_thumbnail_prefix() {
    let dir = image_dir(&["pic.png", "small-pic.png"]);
    let options = Options {
        thumbnail_prefix: "small-".to_string(),
        ..options_in(&dir)
    };
    let (doc, _) = run_with("<book><image src=\"pic.png\"/></book>", &options);
    let BlockNode::Image { thumb_src, .. } = &doc.nodes[0] else {
        panic!("expected an image");
    };
    assert_eq!(thumb_src, "small-pic.png");
}

// ---------------------------------------------------------------------------
// Unknown tags
// ---------------------------------------------------------------------------

#[test]
fn unknown_block_tag_is_reported_and_skipped() {
    let (doc, warnings) = run_with("<book>a<blink>x</blink>b</book>", &Options::default());
    assert_eq!(doc.nodes, vec![para(vec![text("a")]), para(vec![text("b")])]);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, ErrorKind::UnknownTag);
    assert_eq!(warnings[0].to_string(), "book.xml:1: Unknown tag: blink");
}

#[test]
fn unknown_inline_tag_is_reported_and_skipped() {
    let (doc, warnings) = run_with("<book><def>x<b>y</b>z</def></book>", &Options::default());
    assert_eq!(
        doc.nodes,
        vec![para(vec![InlineNode::Definition(vec![text("xz")])])]
    );
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "Unknown tag: b");
}

#[test]
fn strict_mode_rejects_unknown_tags() {
    let options = Options {
        strict: true,
        ..Options::default()
    };
    let err = gritbook::load_str("<book><blink/></book>", "book.xml", &options).unwrap_err();
    let Error::Translation(err) = err else {
        panic!("expected a translation error");
    };
    assert_eq!(err.kind, ErrorKind::UnknownTag);
}

// ---------------------------------------------------------------------------
// Whole-tree properties
// ---------------------------------------------------------------------------

#[test]
fn translating_twice_gives_the_same_tree() {
    let root = gritbook::xml::parse_str(
        "<book>Intro <def>x</def>\n\n<section id=\"s\"><ul><li>a</li></ul></section></book>",
        "book.xml",
    )
    .unwrap();
    let options = Options::default();
    let first = gritbook::translate(&root, &options).unwrap();
    let second = gritbook::translate(&root, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn hand_built_elements() {
    let at = |line| Location::new("mem", line);
    let root = Element::new("book", at(1))
        .with_text("Hello ")
        .with_child(
            Element::new("web", at(1))
                .with_attr("url", "http://example.com")
                .with_text("world")
                .with_tail("!"),
        )
        .with_child(Element::comment(at(2)).with_tail("\n\n"))
        .with_child(
            Element::new("section", at(3))
                .with_attr("id", "s")
                .with_attr("splitbelow", "true")
                .with_child(Element::new("pre", at(4)).with_text("  code")),
        );

    let (doc, warnings) = gritbook::translate(&root, &Options::default()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(
        doc.nodes,
        vec![
            para(vec![
                text("Hello "),
                InlineNode::Web {
                    url: "http://example.com".to_string(),
                    content: vec![text("world")],
                },
                text("!"),
            ]),
            BlockNode::Section {
                id: Some("s".to_string()),
                title: None,
                split: true,
                content: Document::from(vec![BlockNode::Preformatted("code".to_string())]),
            },
        ]
    );
}

#[test]
fn outline_rendering() {
    let doc = run("<book>Hi <issue id=\"5\"/>\n\n<section id=\"s\" title=\"S\" splitbelow=\"true\"><ul><li>x</li></ul></section></book>");
    let expected = "\
Paragraph
  Text \"Hi \"
  Issue 5
Section id=\"s\" title=\"S\" split
  UnorderedList
    Item
      Paragraph
        Text \"x\"
";
    assert_eq!(doc.to_string(), expected);
}
