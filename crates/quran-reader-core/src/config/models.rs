use serde::Deserialize;

/// Flat runtime configuration, built from the grouped TOML tables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub discard_stale_responses: bool,
    pub state_path: String,
    pub log_level: LogLevel,
    pub default_reciter: String,
    pub default_language: String,
    pub default_font: String,
    pub default_font_size: u32,
    pub transliteration_edition: String,
    pub editions: Vec<EditionMapping>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_base_url: crate::config::defaults::default_api_base_url(),
            request_timeout_secs: crate::config::defaults::default_request_timeout_secs(),
            poll_interval_ms: crate::config::defaults::default_poll_interval_ms(),
            discard_stale_responses: crate::config::defaults::default_discard_stale_responses(),
            state_path: crate::config::defaults::default_state_path(),
            log_level: crate::config::defaults::default_log_level(),
            default_reciter: crate::config::defaults::default_reciter(),
            default_language: crate::config::defaults::default_language(),
            default_font: crate::config::defaults::default_font(),
            default_font_size: crate::config::defaults::default_font_size(),
            transliteration_edition: crate::config::defaults::default_transliteration_edition(),
            editions: crate::config::defaults::default_editions(),
        }
    }
}

impl AppConfig {
    /// Keep numeric knobs inside the ranges the runtime can honor.
    pub fn clamped(mut self) -> Self {
        use crate::config::defaults::*;
        self.request_timeout_secs = self
            .request_timeout_secs
            .clamp(MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS);
        self.poll_interval_ms = self
            .poll_interval_ms
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        self.default_font_size = self.default_font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self
    }

    /// Editions for a display language, falling back to the first configured
    /// mapping when the language is unknown.
    pub fn editions_for(&self, language: &str) -> Option<&EditionMapping> {
        self.editions
            .iter()
            .find(|mapping| mapping.language.eq_ignore_ascii_case(language))
            .or_else(|| self.editions.first())
    }

    pub fn min_font_size() -> u32 {
        crate::config::defaults::MIN_FONT_SIZE
    }

    pub fn max_font_size() -> u32 {
        crate::config::defaults::MAX_FONT_SIZE
    }
}

/// Translation and commentary editions used for one display language.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq, Eq)]
pub struct EditionMapping {
    pub language: String,
    pub translation: String,
    #[serde(default)]
    pub commentary: Option<String>,
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
