//! Backend commands queued from UI to backend worker.

use client_core::RowKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    LoadAndRender,
    EditTitle { key: RowKey, value: String },
    ClickUpdate { key: RowKey },
    ClickDelete { key: RowKey },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadAndRender => "load_and_render",
            Self::EditTitle { .. } => "edit_title",
            Self::ClickUpdate { .. } => "click_update",
            Self::ClickDelete { .. } => "click_delete",
        }
    }
}
