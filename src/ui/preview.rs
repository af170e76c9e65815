//! Preview modal: binary viewer surface or rendered markdown

use eframe::egui::{self, RichText};

use super::block_renderer::{render_blocks, BlockAction};
use crate::browser::Command;
use crate::core::modal::{ContentArea, ModalState};

/// What the user did inside the modal this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewAction {
    Command(Command),
    /// Hand a catalog file to the system viewer
    LaunchViewer(String),
    /// Open a link found in rendered markdown
    OpenUrl(String),
}

/// Preview modal overlay
pub struct PreviewModal;

impl PreviewModal {
    /// Show the modal if it is open. `viewer_note` is a status line for the
    /// viewer surface (e.g. a failed hand-off).
    pub fn show(
        ctx: &egui::Context,
        modal: &ModalState,
        viewer_note: Option<&str>,
    ) -> Vec<PreviewAction> {
        let mut actions = Vec::new();
        if !modal.is_open() {
            return actions;
        }

        let screen = ctx.screen_rect();
        let width = (screen.width() * 0.85).max(320.0);
        let height = (screen.height() * 0.85).max(240.0);

        let response = egui::Modal::new(egui::Id::new("preview_modal")).show(ctx, |ui| {
            ui.set_width(width);
            ui.set_height(height);

            ui.horizontal(|ui| {
                let title = modal
                    .current_document()
                    .map(|doc| doc.title.as_str())
                    .unwrap_or_default();
                ui.heading(title);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("✕").on_hover_text("关闭").clicked() {
                        actions.push(PreviewAction::Command(Command::CloseClicked));
                    }
                });
            });
            ui.separator();

            if modal.viewer().visible {
                if let Some(target) = &modal.viewer().target {
                    Self::show_viewer(ui, target, viewer_note, &mut actions);
                }
            } else {
                Self::show_content(ui, modal.content(), &mut actions);
            }
        });

        if response.backdrop_response.clicked() {
            actions.push(PreviewAction::Command(Command::BackdropClicked));
        } else if response.response.clicked() {
            actions.push(PreviewAction::Command(Command::ContentClicked));
        }

        actions
    }

    /// Viewer surface for binary documents
    fn show_viewer(
        ui: &mut egui::Ui,
        target: &str,
        viewer_note: Option<&str>,
        actions: &mut Vec<PreviewAction>,
    ) {
        ui.vertical_centered(|ui| {
            ui.add_space(60.0);
            ui.label(RichText::new("📄").size(48.0));
            ui.add_space(8.0);
            ui.label(RichText::new(target).monospace());
            ui.add_space(16.0);
            if ui.button("用系统查看器打开").clicked() {
                actions.push(PreviewAction::LaunchViewer(target.to_string()));
            }
            if let Some(note) = viewer_note {
                ui.add_space(8.0);
                ui.label(RichText::new(note).color(ui.visuals().warn_fg_color));
            }
        });
    }

    /// Markdown content area
    fn show_content(ui: &mut egui::Ui, content: &ContentArea, actions: &mut Vec<PreviewAction>) {
        match content {
            ContentArea::Hidden => {}
            ContentArea::Loading => {
                ui.vertical_centered(|ui| {
                    ui.add_space(60.0);
                    ui.spinner();
                });
            }
            ContentArea::Failed(message) => {
                let color = ui.visuals().error_fg_color;
                ui.label(RichText::new(message).color(color));
            }
            ContentArea::Rendered(blocks) => {
                egui::ScrollArea::vertical()
                    .id_salt("preview_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        if let Some(BlockAction::OpenUrl(url)) = render_blocks(ui, blocks) {
                            actions.push(PreviewAction::OpenUrl(url));
                        }
                    });
            }
        }
    }
}
