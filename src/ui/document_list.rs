//! Result count and document cards

use eframe::egui::{self, scroll_area::ScrollSource, RichText};

use crate::browser::{Card, Command, ListView, View};

/// Document list panel
pub struct DocumentListPanel;

impl DocumentListPanel {
    /// Show the rendered view. Scrolling is frozen while `scroll_locked`.
    pub fn show(ui: &mut egui::Ui, view: &View, scroll_locked: bool) -> Option<Command> {
        let mut command = None;

        if let Some(count) = &view.count {
            ui.label(RichText::new(count).weak());
            ui.add_space(4.0);
        }

        egui::ScrollArea::vertical()
            .id_salt("document_list_scroll")
            .scroll_source(if scroll_locked {
                ScrollSource::NONE
            } else {
                ScrollSource::ALL
            })
            .auto_shrink([false, false])
            .show(ui, |ui| match &view.list {
                ListView::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("加载中…");
                    });
                }
                ListView::LoadFailed(message) => {
                    let color = ui.visuals().error_fg_color;
                    Self::show_message(ui, message, color);
                }
                ListView::NoResults(message) => {
                    let color = ui.visuals().weak_text_color();
                    Self::show_message(ui, message, color);
                }
                ListView::Cards(cards) => {
                    for card in cards {
                        if Self::show_card(ui, card) {
                            command = Some(Command::OpenDocument(card.index));
                        }
                    }
                }
            });

        command
    }

    /// Show one card; returns true when activated
    fn show_card(ui: &mut egui::Ui, card: &Card) -> bool {
        let response = egui::Frame::group(ui.style())
            .inner_margin(egui::Margin::same(10))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&card.category).small().strong());
                    ui.label(RichText::new(&card.date).small().weak());
                });
                ui.label(RichText::new(&card.title).heading());
            })
            .response
            .interact(egui::Sense::click())
            .on_hover_cursor(egui::CursorIcon::PointingHand);

        ui.add_space(6.0);
        response.clicked()
    }

    fn show_message(ui: &mut egui::Ui, message: &str, color: egui::Color32) {
        ui.vertical_centered(|ui| {
            ui.add_space(50.0);
            ui.label(RichText::new(message).color(color));
        });
    }
}
