use std::{collections::HashMap, fs, path::Path, time::Duration};

use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";
pub const DEFAULT_ROW_COUNT: usize = 30;
pub const DEFAULT_CONFIRMATION_DELAY_MS: u64 = 3000;
pub const SETTINGS_FILE: &str = "post_board.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub row_count: usize,
    pub confirmation_delay_ms: u64,
    pub sample_seed: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            row_count: DEFAULT_ROW_COUNT,
            confirmation_delay_ms: DEFAULT_CONFIRMATION_DELAY_MS,
            sample_seed: None,
        }
    }
}

impl ClientSettings {
    pub fn confirmation_delay(&self) -> Duration {
        Duration::from_millis(self.confirmation_delay_ms)
    }

    /// Applies command-line flags on top of loaded settings.
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        row_count: Option<usize>,
        sample_seed: Option<u64>,
    ) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = normalize_base_url(&base_url);
        }
        if let Some(row_count) = row_count {
            self.row_count = row_count;
        }
        if sample_seed.is_some() {
            self.sample_seed = sample_seed;
        }
        self
    }
}

/// Defaults, then `post_board.toml` in the working directory, then
/// `POST_BOARD_*` environment variables.
pub fn load_settings() -> ClientSettings {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_env(&mut settings, |name| std::env::var(name).ok());
    settings.base_url = normalize_base_url(&settings.base_url);
    settings
}

fn apply_file(settings: &mut ClientSettings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
        Ok(file_cfg) => apply_table(settings, &file_cfg),
        Err(err) => warn!(path = %path.display(), "ignoring unreadable settings file: {err}"),
    }
}

fn apply_table(settings: &mut ClientSettings, table: &HashMap<String, toml::Value>) {
    if let Some(v) = table.get("base_url").and_then(toml::Value::as_str) {
        settings.base_url = v.to_string();
    }
    if let Some(v) = table.get("row_count").and_then(toml::Value::as_integer) {
        if let Ok(v) = usize::try_from(v) {
            settings.row_count = v;
        }
    }
    if let Some(v) = table
        .get("confirmation_delay_ms")
        .and_then(toml::Value::as_integer)
    {
        if let Ok(v) = u64::try_from(v) {
            settings.confirmation_delay_ms = v;
        }
    }
    if let Some(v) = table.get("sample_seed").and_then(toml::Value::as_integer) {
        settings.sample_seed = u64::try_from(v).ok();
    }
}

fn apply_env(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("POST_BOARD_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = var("POST_BOARD_ROWS") {
        match v.parse() {
            Ok(parsed) => settings.row_count = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric POST_BOARD_ROWS"),
        }
    }
    if let Some(v) = var("POST_BOARD_CONFIRMATION_MS") {
        match v.parse() {
            Ok(parsed) => settings.confirmation_delay_ms = parsed,
            Err(_) => warn!(value = %v, "ignoring non-numeric POST_BOARD_CONFIRMATION_MS"),
        }
    }
    if let Some(v) = var("POST_BOARD_SEED") {
        match v.parse() {
            Ok(parsed) => settings.sample_seed = Some(parsed),
            Err(_) => warn!(value = %v, "ignoring non-numeric POST_BOARD_SEED"),
        }
    }
}

/// Collection paths are joined onto the base, so it must end with `/`.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_BASE_URL.to_string();
    }
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}
