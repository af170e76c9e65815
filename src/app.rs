//! Main application state and UI coordination

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use eframe::egui;

use crate::browser::{Browser, Command, Effect, KeyCode};
use crate::core::assets::{AssetSource, FsAssetSource};
use crate::core::config::{AppConfig, UiConfig};
use crate::core::markup::{CommonMarkConverter, MarkupConverter, VerbatimConverter};
use crate::fetcher::Fetcher;
use crate::ui::{
    document_list::DocumentListPanel,
    preview::{PreviewAction, PreviewModal},
    sidebar::CategoryPanel,
};

/// Fonts tried when no CJK font is configured
const SYSTEM_CJK_FONTS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Medium.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "C:\\Windows\\Fonts\\simhei.ttf",
];

/// Main application state
pub struct DocshelfApp {
    /// Catalog, filters, and preview modal
    browser: Browser,
    /// Background fetches
    fetcher: Fetcher,
    /// Application configuration
    config: AppConfig,
    /// Current contents of the search input
    search_text: String,
    /// Status of the last system-viewer hand-off
    viewer_note: Option<String>,
}

impl DocshelfApp {
    /// Create a new application instance and start loading the catalog
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self> {
        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {:#}", e);
            AppConfig::default()
        });

        Self::configure_fonts(&cc.egui_ctx, &config.ui);
        Self::configure_theme(&cc.egui_ctx, &config.ui);

        let converter: Box<dyn MarkupConverter> = if config.preview.render_markdown {
            Box::new(CommonMarkConverter)
        } else {
            Box::new(VerbatimConverter)
        };

        let source: Arc<dyn AssetSource> =
            Arc::new(FsAssetSource::new(config.library.site_root.clone()));
        tracing::info!("Site root: {}", config.library.site_root.display());

        let ctx = cc.egui_ctx.clone();
        let fetcher = Fetcher::new(
            source,
            config.library.catalog_path.clone(),
            Arc::new(move || ctx.request_repaint()),
        )?;

        let mut app = Self {
            browser: Browser::new(converter),
            fetcher,
            config,
            search_text: String::new(),
            viewer_note: None,
        };

        if let Some(effect) = app.browser.start() {
            app.run_effect(effect);
        }

        Ok(app)
    }

    /// Install a font that covers the Chinese UI strings
    fn configure_fonts(ctx: &egui::Context, ui_config: &UiConfig) {
        let candidates = ui_config
            .cjk_font
            .iter()
            .cloned()
            .chain(SYSTEM_CJK_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };

            let mut fonts = egui::FontDefinitions::default();
            fonts.font_data.insert(
                "cjk".to_owned(),
                Arc::new(egui::FontData::from_owned(bytes)),
            );
            for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                fonts
                    .families
                    .entry(family)
                    .or_default()
                    .push("cjk".to_owned());
            }
            ctx.set_fonts(fonts);

            tracing::info!("Loaded CJK font: {}", path.display());
            return;
        }

        tracing::warn!("No CJK font found; Chinese labels may not render");
    }

    fn configure_theme(ctx: &egui::Context, ui_config: &UiConfig) {
        let visuals = if ui_config.theme == "dark" {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);
    }

    /// Perform I/O requested by the browser
    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchCatalog => self.fetcher.fetch_catalog(),
            Effect::FetchMarkup { ticket, file } => {
                self.viewer_note = None;
                self.fetcher.fetch_markup(ticket, file);
            }
            Effect::ShowBinary { file } => {
                self.viewer_note = None;
                if self.config.preview.open_binary_externally {
                    self.launch_viewer(&file);
                }
            }
        }
    }

    /// Hand a document to the platform's default viewer
    fn launch_viewer(&mut self, file: &str) {
        let location = match self.fetcher.source().locate(file) {
            Ok(location) => location,
            Err(e) => {
                tracing::error!("Cannot locate {}: {}", file, e);
                self.viewer_note = Some(format!("无法打开文件：{}", file));
                return;
            }
        };
        match open::that(&location) {
            Ok(()) => {
                tracing::info!("Opened {} in system viewer", location);
                self.viewer_note = None;
            }
            Err(e) => {
                tracing::error!("Failed to open {}: {}", location, e);
                self.viewer_note = Some(format!("无法打开文件：{}", location));
            }
        }
    }

    fn apply(&mut self, command: Command) {
        let is_close = matches!(
            command,
            Command::CloseClicked | Command::BackdropClicked | Command::KeyPressed(_)
        );
        if let Some(effect) = self.browser.dispatch(command) {
            self.run_effect(effect);
        }
        if is_close && !self.browser.modal().is_open() {
            self.viewer_note = None;
        }
    }

    /// Render the top bar with title and search input
    fn render_top_bar(&mut self, ctx: &egui::Context) -> Option<Command> {
        let mut command = None;

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("Docshelf");
                ui.add_space(16.0);
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.search_text)
                        .hint_text("搜索文档标题…")
                        .desired_width(320.0),
                );
                if response.changed() {
                    command = Some(Command::SearchInput(self.search_text.clone()));
                }
            });
            ui.add_space(6.0);
        });

        command
    }
}

impl eframe::App for DocshelfApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Background results first so this frame shows them
        for event in self.fetcher.drain() {
            self.browser.handle_event(event);
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.apply(Command::KeyPressed(KeyCode::Escape));
        }
        self.apply(Command::Tick);

        let mut commands = Vec::new();

        commands.extend(self.render_top_bar(ctx));

        egui::SidePanel::left("categories")
            .resizable(true)
            .default_width(self.config.ui.sidebar_width)
            .min_width(140.0)
            .show(ctx, |ui| {
                commands.extend(CategoryPanel::show(ui, &self.browser));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            commands.extend(DocumentListPanel::show(
                ui,
                self.browser.view(),
                self.browser.modal().scroll_locked(),
            ));
        });

        for action in PreviewModal::show(ctx, self.browser.modal(), self.viewer_note.as_deref()) {
            match action {
                PreviewAction::Command(command) => commands.push(command),
                PreviewAction::LaunchViewer(file) => self.launch_viewer(&file),
                PreviewAction::OpenUrl(url) => {
                    if let Err(e) = open::that(&url) {
                        tracing::error!("Failed to open link {}: {}", url, e);
                    }
                }
            }
        }

        if !commands.is_empty() {
            for command in commands {
                self.apply(command);
            }
            ctx.request_repaint();
        }

        if let Some(remaining) = self.browser.next_deadline() {
            ctx.request_repaint_after(remaining);
        }
    }
}
