//! Category selector

use eframe::egui;

use crate::browser::{Browser, Command};
use crate::core::debounce::Clock;

/// Sidebar listing "all" plus every catalog category
pub struct CategoryPanel;

impl CategoryPanel {
    /// Show the category list; a click yields a selection command
    pub fn show<C: Clock>(ui: &mut egui::Ui, browser: &Browser<C>) -> Option<Command> {
        let mut command = None;

        ui.heading("分类");
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("category_scroll")
            .show(ui, |ui| {
                for option in browser.category_options() {
                    if ui.selectable_label(option.active, &option.label).clicked() {
                        command = Some(Command::SelectCategory(option.filter));
                    }
                }
            });

        command
    }
}
