//! Markdown to structured blocks
//!
//! Converting preview text is a pure function behind [`MarkupConverter`].
//! The default converter walks pulldown-cmark events and builds a small
//! block tree that the UI layer knows how to draw. When markdown rendering
//! is switched off the verbatim converter shows the text unchanged.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Inline run of text with a single style
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSpan {
    Text(String),
    Strong(String),
    Emphasis(String),
    Strikethrough(String),
    Code(String),
    Link { text: String, url: String },
    LineBreak,
}

/// A list item with potential checkbox state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub spans: Vec<InlineSpan>,
    /// Some(true) = checked, Some(false) = unchecked, None = no checkbox
    pub checkbox: Option<bool>,
    /// Nested blocks (sublists, extra paragraphs)
    pub children: Vec<MarkupBlock>,
}

/// Table column alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl From<Alignment> for TableAlignment {
    fn from(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Center => TableAlignment::Center,
            Alignment::Right => TableAlignment::Right,
            Alignment::Left | Alignment::None => TableAlignment::Left,
        }
    }
}

/// A table cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub content: String,
    pub alignment: TableAlignment,
}

/// A block of rendered markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupBlock {
    Heading {
        level: u8,
        spans: Vec<InlineSpan>,
    },
    Paragraph {
        spans: Vec<InlineSpan>,
    },
    CodeBlock {
        lang: Option<String>,
        code: String,
    },
    List {
        items: Vec<ListItem>,
        ordered: bool,
        start: Option<u64>,
    },
    BlockQuote {
        content: Vec<MarkupBlock>,
    },
    Table {
        headers: Vec<TableCell>,
        rows: Vec<Vec<TableCell>>,
    },
    Image {
        alt: String,
        url: String,
        title: Option<String>,
    },
    HorizontalRule,
    /// Unconverted source text
    Verbatim(String),
}

/// Pure text to structured-markup conversion
pub trait MarkupConverter: Send + Sync {
    fn convert(&self, source: &str) -> Vec<MarkupBlock>;
}

/// CommonMark (plus tables, strikethrough and task lists) via pulldown-cmark
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkConverter;

impl MarkupConverter for CommonMarkConverter {
    fn convert(&self, source: &str) -> Vec<MarkupBlock> {
        parse_blocks(source)
    }
}

/// Shows the source as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimConverter;

impl MarkupConverter for VerbatimConverter {
    fn convert(&self, source: &str) -> Vec<MarkupBlock> {
        vec![MarkupBlock::Verbatim(source.to_string())]
    }
}

/// Open container while walking the event stream
enum Frame {
    Quote(Vec<MarkupBlock>),
    List {
        ordered: bool,
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Item(ListItem),
}

#[derive(Default)]
struct TableState {
    alignments: Vec<TableAlignment>,
    headers: Vec<TableCell>,
    rows: Vec<Vec<TableCell>>,
    row: Vec<TableCell>,
    in_head: bool,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<MarkupBlock>,
    frames: Vec<Frame>,
    spans: Vec<InlineSpan>,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    link: Option<(String, String)>,
    image: Option<(String, Option<String>, String)>,
    code: Option<(Option<String>, String)>,
    table: Option<TableState>,
}

impl BlockBuilder {
    fn push_block(&mut self, block: MarkupBlock) {
        match self.frames.last_mut() {
            Some(Frame::Quote(content)) => content.push(block),
            Some(Frame::Item(item)) => match block {
                // Loose list items wrap their text in a paragraph
                MarkupBlock::Paragraph { spans } if item.spans.is_empty() => item.spans = spans,
                other => item.children.push(other),
            },
            // Lists only ever hold items directly
            Some(Frame::List { .. }) | None => self.blocks.push(block),
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, _, alt)) = self.image.as_mut() {
            alt.push_str(text);
        } else if let Some((_, code)) = self.code.as_mut() {
            code.push_str(text);
        } else if let Some((_, link_text)) = self.link.as_mut() {
            link_text.push_str(text);
        } else {
            let span = if self.strikethrough > 0 {
                InlineSpan::Strikethrough(text.to_string())
            } else if self.strong > 0 {
                InlineSpan::Strong(text.to_string())
            } else if self.emphasis > 0 {
                InlineSpan::Emphasis(text.to_string())
            } else {
                InlineSpan::Text(text.to_string())
            };
            self.spans.push(span);
        }
    }

    fn take_spans(&mut self) -> Vec<InlineSpan> {
        std::mem::take(&mut self.spans)
    }

    fn flush_paragraph(&mut self) {
        let spans = self.take_spans();
        if !spans.is_empty() {
            self.push_block(MarkupBlock::Paragraph { spans });
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::Heading { .. } => {
                self.spans.clear();
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.code = Some((lang, String::new()));
            }
            Tag::List(start) => {
                // Text of a tight parent item comes before its sublist
                if matches!(self.frames.last(), Some(Frame::Item(_))) {
                    self.flush_item_text();
                }
                self.frames.push(Frame::List {
                    ordered: start.is_some(),
                    start,
                    items: Vec::new(),
                });
            }
            Tag::Item => {
                self.spans.clear();
                self.frames.push(Frame::Item(ListItem::default()));
            }
            Tag::BlockQuote(_) => {
                self.frames.push(Frame::Quote(Vec::new()));
            }
            Tag::Table(alignments) => {
                self.table = Some(TableState {
                    alignments: alignments.into_iter().map(TableAlignment::from).collect(),
                    ..TableState::default()
                });
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_head = true;
                    table.row.clear();
                }
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.row.clear();
                }
            }
            Tag::TableCell => {
                self.spans.clear();
            }
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Strikethrough => self.strikethrough += 1,
            Tag::Link { dest_url, .. } => {
                self.link = Some((dest_url.to_string(), String::new()));
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let title = if title.is_empty() {
                    None
                } else {
                    Some(title.to_string())
                };
                self.image = Some((dest_url.to_string(), title, String::new()));
            }
            _ => {}
        }
    }

    /// Move pending inline text into the innermost open list item
    fn flush_item_text(&mut self) {
        let spans = self.take_spans();
        if let Some(Frame::Item(item)) = self.frames.last_mut() {
            if item.spans.is_empty() {
                item.spans = spans;
            } else if !spans.is_empty() {
                item.children.push(MarkupBlock::Paragraph { spans });
            }
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush_paragraph(),
            TagEnd::Heading(level) => {
                let spans = self.take_spans();
                self.push_block(MarkupBlock::Heading {
                    level: level as u8,
                    spans,
                });
            }
            TagEnd::CodeBlock => {
                if let Some((lang, code)) = self.code.take() {
                    self.push_block(MarkupBlock::CodeBlock { lang, code });
                }
            }
            TagEnd::Item => {
                self.flush_item_text();
                if let Some(Frame::Item(item)) = self.frames.pop() {
                    if let Some(Frame::List { items, .. }) = self.frames.last_mut() {
                        items.push(item);
                    }
                }
            }
            TagEnd::List(_) => {
                if let Some(Frame::List {
                    ordered,
                    start,
                    items,
                }) = self.frames.pop()
                {
                    self.push_block(MarkupBlock::List {
                        items,
                        ordered,
                        start,
                    });
                }
            }
            TagEnd::BlockQuote(_) => {
                self.flush_paragraph();
                if let Some(Frame::Quote(content)) = self.frames.pop() {
                    self.push_block(MarkupBlock::BlockQuote { content });
                }
            }
            TagEnd::TableCell => {
                let content = plain_text(&self.take_spans());
                if let Some(table) = self.table.as_mut() {
                    let alignment = table
                        .alignments
                        .get(table.row.len())
                        .copied()
                        .unwrap_or_default();
                    table.row.push(TableCell { content, alignment });
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.headers = std::mem::take(&mut table.row);
                    table.in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    if !table.in_head {
                        let row = std::mem::take(&mut table.row);
                        table.rows.push(row);
                    }
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.push_block(MarkupBlock::Table {
                        headers: table.headers,
                        rows: table.rows,
                    });
                }
            }
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Strikethrough => self.strikethrough = self.strikethrough.saturating_sub(1),
            TagEnd::Link => {
                if let Some((url, text)) = self.link.take() {
                    self.spans.push(InlineSpan::Link { text, url });
                }
            }
            TagEnd::Image => {
                if let Some((url, title, alt)) = self.image.take() {
                    // Images are inline but we treat them as blocks
                    self.flush_paragraph();
                    self.push_block(MarkupBlock::Image { alt, url, title });
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<MarkupBlock> {
        self.flush_paragraph();
        self.blocks
    }
}

/// Flatten spans into plain text
fn plain_text(spans: &[InlineSpan]) -> String {
    spans
        .iter()
        .map(|span| match span {
            InlineSpan::Text(t)
            | InlineSpan::Strong(t)
            | InlineSpan::Emphasis(t)
            | InlineSpan::Strikethrough(t)
            | InlineSpan::Code(t) => t.as_str(),
            InlineSpan::Link { text, .. } => text.as_str(),
            InlineSpan::LineBreak => "\n",
        })
        .collect()
}

/// Parse markdown content into blocks
pub fn parse_blocks(content: &str) -> Vec<MarkupBlock> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut builder = BlockBuilder::default();

    for event in Parser::new_ext(content, options) {
        match event {
            Event::Start(tag) => builder.start(tag),
            Event::End(tag) => builder.end(tag),
            Event::Text(text) => builder.push_text(&text),
            Event::Code(code) => {
                if let Some((_, link_text)) = builder.link.as_mut() {
                    link_text.push_str(&code);
                } else {
                    builder.spans.push(InlineSpan::Code(code.to_string()));
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => builder.push_text(&html),
            Event::SoftBreak => builder.push_text(" "),
            Event::HardBreak => builder.spans.push(InlineSpan::LineBreak),
            Event::Rule => builder.push_block(MarkupBlock::HorizontalRule),
            Event::TaskListMarker(checked) => {
                if let Some(Frame::Item(item)) = builder.frames.last_mut() {
                    item.checkbox = Some(checked);
                }
            }
            _ => {}
        }
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> InlineSpan {
        InlineSpan::Text(s.to_string())
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let blocks = parse_blocks("# Title\n\nSome **bold** and *soft* text.\n\n## Sub");
        assert_eq!(
            blocks,
            vec![
                MarkupBlock::Heading {
                    level: 1,
                    spans: vec![text("Title")],
                },
                MarkupBlock::Paragraph {
                    spans: vec![
                        text("Some "),
                        InlineSpan::Strong("bold".to_string()),
                        text(" and "),
                        InlineSpan::Emphasis("soft".to_string()),
                        text(" text."),
                    ],
                },
                MarkupBlock::Heading {
                    level: 2,
                    spans: vec![text("Sub")],
                },
            ]
        );
    }

    #[test]
    fn test_code_block_and_inline_code() {
        let blocks = parse_blocks("Run `cargo`:\n\n```sh\nls -la\n```\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            MarkupBlock::Paragraph {
                spans: vec![
                    text("Run "),
                    InlineSpan::Code("cargo".to_string()),
                    text(":"),
                ],
            }
        );
        assert_eq!(
            blocks[1],
            MarkupBlock::CodeBlock {
                lang: Some("sh".to_string()),
                code: "ls -la\n".to_string(),
            }
        );
    }

    #[test]
    fn test_task_list_and_nested_list() {
        let blocks = parse_blocks("- [x] done\n- [ ] todo\n  1. first\n  2. second\n");
        let MarkupBlock::List { items, ordered, .. } = &blocks[0] else {
            panic!("expected list, got {:?}", blocks);
        };
        assert!(!ordered);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].checkbox, Some(true));
        assert_eq!(items[0].spans, vec![text("done")]);
        assert_eq!(items[1].checkbox, Some(false));
        assert_eq!(items[1].spans, vec![text("todo")]);

        let MarkupBlock::List {
            items: nested,
            ordered: nested_ordered,
            start,
        } = &items[1].children[0]
        else {
            panic!("expected nested list, got {:?}", items[1].children);
        };
        assert!(nested_ordered);
        assert_eq!(*start, Some(1));
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[1].spans, vec![text("second")]);
    }

    #[test]
    fn test_blockquote_link_and_rule() {
        let blocks = parse_blocks("> see [docs](https://example.com)\n\n---\n");
        assert_eq!(
            blocks,
            vec![
                MarkupBlock::BlockQuote {
                    content: vec![MarkupBlock::Paragraph {
                        spans: vec![
                            text("see "),
                            InlineSpan::Link {
                                text: "docs".to_string(),
                                url: "https://example.com".to_string(),
                            },
                        ],
                    }],
                },
                MarkupBlock::HorizontalRule,
            ]
        );
    }

    #[test]
    fn test_table() {
        let blocks = parse_blocks("| a | b |\n|:-:|--:|\n| 1 | 2 |\n");
        let MarkupBlock::Table { headers, rows } = &blocks[0] else {
            panic!("expected table, got {:?}", blocks);
        };
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].content, "a");
        assert_eq!(headers[0].alignment, TableAlignment::Center);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1].content, "2");
        assert_eq!(rows[0][1].alignment, TableAlignment::Right);
    }

    #[test]
    fn test_image_becomes_block() {
        let blocks = parse_blocks("![chart](img/chart.png \"Q1\")");
        assert_eq!(
            blocks,
            vec![MarkupBlock::Image {
                alt: "chart".to_string(),
                url: "img/chart.png".to_string(),
                title: Some("Q1".to_string()),
            }]
        );
    }

    #[test]
    fn test_verbatim_converter_keeps_source() {
        let source = "# not a heading here";
        assert_eq!(
            VerbatimConverter.convert(source),
            vec![MarkupBlock::Verbatim(source.to_string())]
        );
    }

    #[test]
    fn test_empty_source() {
        assert!(CommonMarkConverter.convert("").is_empty());
    }
}
