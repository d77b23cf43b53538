use client_core::{Row, RowKey, CONFIRMATION_LABEL};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use indexmap::IndexMap;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{err_label, UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const LOADING_PLACEHOLDER: &str = "Loading...";

#[derive(Debug, Clone)]
struct StatusBanner {
    message: String,
}

impl StatusBanner {
    fn from_error(err: &UiError) -> Self {
        let scope = match err.context() {
            UiErrorContext::BackendStartup => "startup",
            UiErrorContext::UpdateTitle => "update",
            UiErrorContext::DeleteRow => "delete",
            UiErrorContext::General => "board",
        };
        Self {
            message: format!("{} ({scope}): {}", err_label(err.category()), err.message()),
        }
    }
}

/// Local mirror of a controller row. `draft` is what the text field shows;
/// it is only reset by a full render so typing is never overwritten by a
/// late snapshot.
struct RowView {
    row: Row,
    draft: String,
}

impl RowView {
    fn new(row: Row) -> Self {
        Self {
            draft: row.title_field().to_string(),
            row,
        }
    }
}

pub struct PostBoardApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    base_url: String,
    loading: bool,
    rows: IndexMap<RowKey, RowView>,
    status: String,
    status_banner: Option<StatusBanner>,
}

impl PostBoardApp {
    /// Creates the app and queues the initial load.
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        base_url: String,
    ) -> Self {
        let mut app = Self::new(cmd_tx, ui_rx, base_url);
        dispatch_backend_command(&app.cmd_tx, BackendCommand::LoadAndRender, &mut app.status);
        app
    }

    fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>, base_url: String) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            base_url,
            loading: true,
            rows: IndexMap::new(),
            status: "Starting".to_string(),
            status_banner: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Rendered(rows) => {
                    self.loading = false;
                    self.status = format!("{} posts", rows.len());
                    self.rows = rows
                        .into_iter()
                        .map(|row| (row.key(), RowView::new(row)))
                        .collect();
                }
                UiEvent::RowChanged(row) => {
                    if let Some(view) = self.rows.get_mut(&row.key()) {
                        view.row = row;
                    }
                }
                UiEvent::RowRemoved(key) => {
                    self.rows.shift_remove(&key);
                    self.status = format!("{} posts", self.rows.len());
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), "{}", err.message());
                    self.status_banner = Some(StatusBanner::from_error(&err));
                }
            }
        }
    }

    fn queue(&mut self, cmds: Vec<BackendCommand>) {
        for cmd in cmds {
            dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            egui::Frame::NONE
                .fill(egui::Color32::from_rgb(111, 53, 53))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
            ui.add_space(6.0);
        }
    }

    fn show_rows(&mut self, ui: &mut egui::Ui) -> Vec<BackendCommand> {
        let mut cmds = Vec::new();
        if self.loading {
            ui.label(LOADING_PLACEHOLDER);
            return cmds;
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (key, view) in self.rows.iter_mut() {
                    let key = *key;
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 8.0;

                        let field = ui.add(
                            egui::TextEdit::singleline(&mut view.draft)
                                .id(egui::Id::new(("post_title", key)))
                                .desired_width(360.0),
                        );
                        if field.changed() {
                            cmds.push(BackendCommand::EditTitle {
                                key,
                                value: view.draft.clone(),
                            });
                        }

                        if let Some(update) = view.row.update() {
                            let button = egui::Button::new(update.label());
                            if ui.add_enabled(update.is_clickable(), button).clicked() {
                                cmds.push(BackendCommand::ClickUpdate { key });
                            }
                        }
                        if view.row.shows_confirmation() {
                            ui.label(
                                egui::RichText::new(CONFIRMATION_LABEL)
                                    .color(egui::Color32::from_rgb(87, 171, 90)),
                            );
                        }

                        ui.label(egui::RichText::new(&view.row.album().title).italics())
                            .on_hover_text(view.row.album_label_id());
                        ui.label(egui::RichText::new(&view.row.user().name).strong())
                            .on_hover_text(view.row.user_label_id());

                        let delete = view.row.delete();
                        let button = egui::Button::new(delete.label());
                        if ui
                            .add_enabled(delete.is_clickable(), button)
                            .on_hover_text(view.row.delete_label_id())
                            .clicked()
                        {
                            cmds.push(BackendCommand::ClickDelete { key });
                        }
                    });
                }
            });
        cmds
    }
}

impl eframe::App for PostBoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::top("board_header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Posts");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(&self.base_url);
                });
            });
        });
        egui::TopBottomPanel::bottom("board_status").show(ctx, |ui| {
            ui.small(&self.status);
        });

        let mut cmds = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            cmds = self.show_rows(ui);
        });
        self.queue(cmds);

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
