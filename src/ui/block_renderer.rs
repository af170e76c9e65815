//! Block rendering for markdown previews

use eframe::egui::{self, Color32, FontId, RichText, Ui};

use crate::core::markup::{InlineSpan, ListItem, MarkupBlock, TableAlignment, TableCell};

/// Action that can be triggered by block interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockAction {
    /// Open external URL
    OpenUrl(String),
}

/// Render a sequence of blocks, returning the last triggered action
pub fn render_blocks(ui: &mut Ui, blocks: &[MarkupBlock]) -> Option<BlockAction> {
    let mut action = None;
    for block in blocks {
        if let Some(a) = render_block(ui, block) {
            action = Some(a);
        }
    }
    action
}

/// Render a parsed block to the UI
pub fn render_block(ui: &mut Ui, block: &MarkupBlock) -> Option<BlockAction> {
    match block {
        MarkupBlock::Heading { level, spans } => render_heading(ui, *level, spans),
        MarkupBlock::Paragraph { spans } => {
            let action = ui.horizontal_wrapped(|ui| render_spans(ui, spans)).inner;
            ui.add_space(8.0);
            action
        }
        MarkupBlock::CodeBlock { lang, code } => {
            render_code_block(ui, lang.as_deref(), code);
            None
        }
        MarkupBlock::List {
            items,
            ordered,
            start,
        } => render_list(ui, items, *ordered, *start),
        MarkupBlock::BlockQuote { content } => render_blockquote(ui, content),
        MarkupBlock::Table { headers, rows } => {
            render_table(ui, headers, rows);
            None
        }
        MarkupBlock::Image { alt, url, title } => {
            render_image(ui, alt, url, title.as_deref());
            None
        }
        MarkupBlock::HorizontalRule => {
            ui.add_space(8.0);
            ui.separator();
            ui.add_space(8.0);
            None
        }
        MarkupBlock::Verbatim(text) => {
            ui.add(egui::Label::new(RichText::new(text).font(FontId::monospace(14.0))).wrap());
            None
        }
    }
}

/// Render inline spans into the current (wrapped) layout
fn render_spans(ui: &mut Ui, spans: &[InlineSpan]) -> Option<BlockAction> {
    let mut action = None;

    for span in spans {
        match span {
            InlineSpan::Text(t) => {
                ui.label(t);
            }
            InlineSpan::Strong(t) => {
                ui.label(RichText::new(t).strong());
            }
            InlineSpan::Emphasis(t) => {
                ui.label(RichText::new(t).italics());
            }
            InlineSpan::Strikethrough(t) => {
                ui.label(RichText::new(t).strikethrough());
            }
            InlineSpan::Code(code) => {
                let text = RichText::new(code)
                    .font(FontId::monospace(14.0))
                    .background_color(ui.visuals().code_bg_color);
                ui.label(text);
            }
            InlineSpan::Link { text, url } => {
                let response = ui.link(text).on_hover_text(url);
                if response.clicked() {
                    action = Some(BlockAction::OpenUrl(url.clone()));
                }
            }
            InlineSpan::LineBreak => {
                ui.end_row();
            }
        }
    }

    action
}

/// Render a heading
fn render_heading(ui: &mut Ui, level: u8, spans: &[InlineSpan]) -> Option<BlockAction> {
    let font_size = match level {
        1 => 28.0,
        2 => 24.0,
        3 => 20.0,
        4 => 18.0,
        5 => 16.0,
        _ => 14.0,
    };

    let mut text = String::new();
    for span in spans {
        match span {
            InlineSpan::Text(t)
            | InlineSpan::Strong(t)
            | InlineSpan::Emphasis(t)
            | InlineSpan::Strikethrough(t)
            | InlineSpan::Code(t) => text.push_str(t),
            InlineSpan::Link { text: t, .. } => text.push_str(t),
            InlineSpan::LineBreak => text.push(' '),
        }
    }

    ui.label(RichText::new(text).font(FontId::proportional(font_size)).strong());

    // Add spacing after heading
    ui.add_space(match level {
        1 => 12.0,
        2 => 10.0,
        _ => 6.0,
    });

    None
}

/// Render a code block
fn render_code_block(ui: &mut Ui, lang: Option<&str>, code: &str) {
    egui::Frame::new()
        .fill(ui.visuals().code_bg_color)
        .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
        .inner_margin(egui::Margin::same(8))
        .outer_margin(egui::Margin::symmetric(0, 4))
        .corner_radius(4.0)
        .show(ui, |ui| {
            // Language label
            if let Some(lang) = lang {
                ui.label(
                    RichText::new(lang)
                        .font(FontId::monospace(12.0))
                        .color(Color32::from_rgb(128, 128, 128)),
                );
                ui.add_space(4.0);
            }

            ui.label(RichText::new(code).font(FontId::monospace(14.0)));
        });

    ui.add_space(8.0);
}

/// Render a list (ordered or unordered)
fn render_list(
    ui: &mut Ui,
    items: &[ListItem],
    ordered: bool,
    start: Option<u64>,
) -> Option<BlockAction> {
    let mut action = None;
    let start_num = start.unwrap_or(1);
    let marker_color = Color32::from_rgb(150, 150, 150);

    for (idx, item) in items.iter().enumerate() {
        ui.horizontal_wrapped(|ui| {
            ui.add_space(16.0);

            if let Some(checked) = item.checkbox {
                let checkbox_text = if checked { "[x]" } else { "[ ]" };
                ui.label(
                    RichText::new(checkbox_text)
                        .font(FontId::monospace(14.0))
                        .color(marker_color),
                );
            } else if ordered {
                let num = start_num + idx as u64;
                ui.label(RichText::new(format!("{}.", num)).color(marker_color));
            } else {
                ui.label(RichText::new("•").color(marker_color));
            }

            if let Some(a) = render_spans(ui, &item.spans) {
                action = Some(a);
            }
        });

        if !item.children.is_empty() {
            ui.horizontal(|ui| {
                ui.add_space(24.0);
                ui.vertical(|ui| {
                    if let Some(a) = render_blocks(ui, &item.children) {
                        action = Some(a);
                    }
                });
            });
        }
    }

    ui.add_space(8.0);
    action
}

/// Render a blockquote
fn render_blockquote(ui: &mut Ui, content: &[MarkupBlock]) -> Option<BlockAction> {
    let mut action = None;

    egui::Frame::new()
        .fill(ui.visuals().faint_bg_color)
        .inner_margin(egui::Margin {
            left: 12,
            right: 8,
            top: 8,
            bottom: 8,
        })
        .show(ui, |ui| {
            // Left border effect
            let rect = ui.max_rect();
            ui.painter().rect_filled(
                egui::Rect::from_min_size(rect.min - egui::vec2(12.0, 8.0), egui::vec2(4.0, rect.height() + 16.0)),
                0.0,
                Color32::from_rgb(100, 100, 120),
            );

            action = render_blocks(ui, content);
        });

    ui.add_space(8.0);
    action
}

/// Render a table
fn render_table(ui: &mut Ui, headers: &[TableCell], rows: &[Vec<TableCell>]) {
    use egui_extras::{Column, TableBuilder};

    let num_cols = headers.len().max(1);

    ui.push_id(ui.next_auto_id(), |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .columns(Column::auto().at_least(60.0), num_cols)
            .header(20.0, |mut header| {
                for cell in headers {
                    header.col(|ui| {
                        cell_label(ui, cell, true);
                    });
                }
            })
            .body(|mut body| {
                for row in rows {
                    body.row(18.0, |mut row_ui| {
                        for cell in row {
                            row_ui.col(|ui| {
                                cell_label(ui, cell, false);
                            });
                        }
                    });
                }
            });
    });

    ui.add_space(8.0);
}

fn cell_label(ui: &mut Ui, cell: &TableCell, strong: bool) {
    let align = match cell.alignment {
        TableAlignment::Left => egui::Align::Min,
        TableAlignment::Center => egui::Align::Center,
        TableAlignment::Right => egui::Align::Max,
    };
    let text = if strong {
        RichText::new(&cell.content).strong()
    } else {
        RichText::new(&cell.content)
    };
    ui.with_layout(egui::Layout::top_down(align), |ui| {
        ui.label(text);
    });
}

/// Render an image placeholder with its alt text and URL
fn render_image(ui: &mut Ui, alt: &str, url: &str, title: Option<&str>) {
    egui::Frame::new()
        .fill(ui.visuals().faint_bg_color)
        .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
        .inner_margin(egui::Margin::same(8))
        .corner_radius(4.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("🖼").font(FontId::proportional(24.0)));
                ui.vertical(|ui| {
                    if !alt.is_empty() {
                        ui.label(RichText::new(alt).italics());
                    }
                    if let Some(title) = title {
                        ui.label(title);
                    }
                    ui.label(
                        RichText::new(url)
                            .font(FontId::monospace(12.0))
                            .color(Color32::from_rgb(128, 128, 128)),
                    );
                });
            });
        });

    ui.add_space(8.0);
}
