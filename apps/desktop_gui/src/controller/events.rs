//! UI/backend events and error modeling for the desktop GUI controller.

use client_core::{Row, RowKey};

pub enum UiEvent {
    Info(String),
    Rendered(Vec<Row>),
    RowChanged(Row),
    RowRemoved(RowKey),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Decode,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    UpdateTitle,
    DeleteRow,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("malformed")
            || message_lower.contains("decode")
            || message_lower.contains("expected value")
        {
            UiErrorCategory::Decode
        } else if message_lower.contains("invalid")
            || message_lower.contains("no rendered row")
            || message_lower.contains("empty")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("request to")
            || message_lower.contains("status")
            || message_lower.contains("disconnect")
            || message_lower.contains("unavailable")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Network",
        UiErrorCategory::Decode => "Bad response",
        UiErrorCategory::Validation => "Invalid",
        UiErrorCategory::Unknown => "Error",
    }
}
