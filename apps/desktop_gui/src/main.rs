mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::load_settings;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::PostBoardApp;

#[derive(Parser, Debug)]
#[command(about = "Browse, retitle and delete a randomly composed board of posts")]
struct Args {
    /// REST API origin serving users/, albums/ and posts/.
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    rows: Option<usize>,
    /// Fixed sampling seed for a reproducible board.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> eframe::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let settings = load_settings().with_overrides(args.base_url, args.rows, args.seed);
    tracing::info!(
        base_url = %settings.base_url,
        rows = settings.row_count,
        "starting post board"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let base_url = settings.base_url.clone();
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Post Board")
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Post Board",
        options,
        Box::new(|_cc| Ok(Box::new(PostBoardApp::bootstrap(cmd_tx, ui_rx, base_url)))),
    )
}
