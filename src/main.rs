//! Docshelf - lightweight document shelf
//!
//! Browses a static catalog of documents by category and title, and previews
//! PDF or markdown files in a modal overlay.

mod app;
mod browser;
mod core;
mod fetcher;
mod ui;

use app::DocshelfApp;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    tracing::info!("Starting Docshelf...");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 480.0])
            .with_title("Docshelf"),
        ..Default::default()
    };

    eframe::run_native(
        "Docshelf",
        native_options,
        Box::new(|cc| Ok(Box::new(DocshelfApp::new(cc)?))),
    )
}
