//! Worker thread running the page controller on a tokio runtime.

use std::{sync::Arc, thread};

use client_core::{ClientSettings, HttpFeedClient, PageConfig, PageController, PageEvent};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast::error::RecvError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    settings: ClientSettings,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let api = match HttpFeedClient::new(&settings.base_url) {
                Ok(api) => api,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err}"),
                    )));
                    tracing::error!("unusable feed base url: {err}");
                    return;
                }
            };
            let controller = PageController::new(Arc::new(api), PageConfig::from(&settings));

            let mut events = controller.subscribe_events();
            let ui_tx_events = ui_tx.clone();
            let event_task = tokio::spawn(async move {
                loop {
                    let evt = match events.recv().await {
                        Ok(PageEvent::Rendered(rows)) => UiEvent::Rendered(rows),
                        Ok(PageEvent::RowChanged(row)) => UiEvent::RowChanged(row),
                        Ok(PageEvent::RowRemoved(key)) => UiEvent::RowRemoved(key),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "ui fell behind page events");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };
                    let _ = ui_tx_events.try_send(evt);
                }
            });

            tracing::info!(base_url = %settings.base_url, "backend worker ready");
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::LoadAndRender => {
                        let controller = controller.clone();
                        tokio::spawn(async move {
                            // Left on the placeholder; the failure is only logged.
                            if let Err(err) = controller.load_and_render().await {
                                tracing::error!("initial load failed: {err}");
                            }
                        });
                    }
                    BackendCommand::EditTitle { key, value } => {
                        // Applied inline so keystrokes land in order.
                        if let Err(err) = controller.on_post_edited(key, value).await {
                            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                UiErrorContext::General,
                                err.to_string(),
                            )));
                        }
                    }
                    BackendCommand::ClickUpdate { key } => {
                        let controller = controller.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            match controller.on_update_clicked(key).await {
                                Ok(outcome) => {
                                    tracing::debug!(row = %key, ?outcome, "update finished");
                                }
                                Err(err) => {
                                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                        UiErrorContext::UpdateTitle,
                                        err.to_string(),
                                    )));
                                }
                            }
                        });
                    }
                    BackendCommand::ClickDelete { key } => {
                        let controller = controller.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            match controller.on_delete_clicked(key).await {
                                Ok(outcome) => {
                                    tracing::debug!(row = %key, ?outcome, "delete finished");
                                }
                                Err(err) => {
                                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                        UiErrorContext::DeleteRow,
                                        err.to_string(),
                                    )));
                                }
                            }
                        });
                    }
                }
            }

            event_task.abort();
        });
    });
}
