use super::defaults;
use super::models::{AppConfig, EditionMapping, LogLevel};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    api: ApiConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    defaults: PreferenceDefaults,
    #[serde(default = "defaults::default_editions")]
    editions: Vec<EditionMapping>,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            api_base_url: tables.api.base_url,
            request_timeout_secs: tables.api.request_timeout_secs,
            discard_stale_responses: tables.api.discard_stale_responses,
            transliteration_edition: tables.api.transliteration_edition,
            poll_interval_ms: tables.playback.poll_interval_ms,
            state_path: tables.storage.state_path,
            log_level: tables.logging.log_level,
            default_reciter: tables.defaults.reciter,
            default_language: tables.defaults.language,
            default_font: tables.defaults.font,
            default_font_size: tables.defaults.font_size,
            editions: tables.editions,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            api: ApiConfig {
                base_url: config.api_base_url.clone(),
                request_timeout_secs: config.request_timeout_secs,
                discard_stale_responses: config.discard_stale_responses,
                transliteration_edition: config.transliteration_edition.clone(),
            },
            playback: PlaybackConfig {
                poll_interval_ms: config.poll_interval_ms,
            },
            storage: StorageConfig {
                state_path: config.state_path.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            defaults: PreferenceDefaults {
                reciter: config.default_reciter.clone(),
                language: config.default_language.clone(),
                font: config.default_font.clone(),
                font_size: config.default_font_size,
            },
            editions: config.editions.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ApiConfig {
    #[serde(default = "defaults::default_api_base_url")]
    base_url: String,
    #[serde(default = "defaults::default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "defaults::default_discard_stale_responses")]
    discard_stale_responses: bool,
    #[serde(default = "defaults::default_transliteration_edition")]
    transliteration_edition: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::default_api_base_url(),
            request_timeout_secs: defaults::default_request_timeout_secs(),
            discard_stale_responses: defaults::default_discard_stale_responses(),
            transliteration_edition: defaults::default_transliteration_edition(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_poll_interval_ms")]
    poll_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_state_path")]
    state_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: defaults::default_state_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PreferenceDefaults {
    #[serde(default = "defaults::default_reciter")]
    reciter: String,
    #[serde(default = "defaults::default_language")]
    language: String,
    #[serde(default = "defaults::default_font")]
    font: String,
    #[serde(default = "defaults::default_font_size")]
    font_size: u32,
}

impl Default for PreferenceDefaults {
    fn default() -> Self {
        Self {
            reciter: defaults::default_reciter(),
            language: defaults::default_language(),
            font: defaults::default_font(),
            font_size: defaults::default_font_size(),
        }
    }
}
