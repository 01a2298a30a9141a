use super::models::{EditionMapping, LogLevel};

pub(crate) const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;
pub(crate) const MAX_REQUEST_TIMEOUT_SECS: u64 = 120;
pub(crate) const MIN_POLL_INTERVAL_MS: u64 = 10;
pub(crate) const MAX_POLL_INTERVAL_MS: u64 = 1000;
pub(crate) const MIN_FONT_SIZE: u32 = 12;
pub(crate) const MAX_FONT_SIZE: u32 = 64;

pub(crate) fn default_api_base_url() -> String {
    "https://api.alquran.cloud/v1".to_string()
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    15
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    50
}

pub(crate) fn default_discard_stale_responses() -> bool {
    false
}

pub(crate) fn default_state_path() -> String {
    ".cache/state.toml".to_string()
}

pub(crate) fn default_log_level() -> LogLevel {
    LogLevel::Info
}

pub(crate) fn default_reciter() -> String {
    "ar.alafasy".to_string()
}

pub(crate) fn default_language() -> String {
    "id".to_string()
}

pub(crate) fn default_font() -> String {
    "amiri".to_string()
}

pub(crate) fn default_font_size() -> u32 {
    24
}

pub(crate) fn default_transliteration_edition() -> String {
    "en.transliteration".to_string()
}

pub(crate) fn default_editions() -> Vec<EditionMapping> {
    vec![
        EditionMapping {
            language: "id".to_string(),
            translation: "id.indonesian".to_string(),
            commentary: Some("id.kemenag".to_string()),
        },
        EditionMapping {
            language: "en".to_string(),
            translation: "en.sahih".to_string(),
            commentary: None,
        },
    ]
}
