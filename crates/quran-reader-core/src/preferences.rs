//! Reader preferences: reciter, font, display language and reading mode.

use crate::config::AppConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

/// How much of each verse is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ReadingMode {
    ScriptOnly,
    #[default]
    WithTranslation,
    WithTranslationAndTransliteration,
}

impl ReadingMode {
    pub fn shows_translation(self) -> bool {
        !matches!(self, ReadingMode::ScriptOnly)
    }

    pub fn shows_transliteration(self) -> bool {
        matches!(self, ReadingMode::WithTranslationAndTransliteration)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "script" | "script-only" | "arabic" | "arabic-only" => Some(ReadingMode::ScriptOnly),
            "translation" | "with-translation" => Some(ReadingMode::WithTranslation),
            "transliteration" | "phonetic" | "with-translation-and-transliteration" => {
                Some(ReadingMode::WithTranslationAndTransliteration)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ReadingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReadingMode::ScriptOnly => "script-only",
            ReadingMode::WithTranslation => "with-translation",
            ReadingMode::WithTranslationAndTransliteration => {
                "with-translation-and-transliteration"
            }
        };
        write!(f, "{}", label)
    }
}

/// Persisted visual and audio settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settings {
    pub font: String,
    pub font_size: u32,
    pub reciter_id: String,
    pub language: String,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            font: config.default_font.clone(),
            font_size: config.default_font_size,
            reciter_id: config.default_reciter.clone(),
            language: config.default_language.clone(),
        }
    }
}

/// Partial settings update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct SettingsPatch {
    #[ts(optional)]
    pub font: Option<String>,
    #[ts(optional)]
    pub font_size: Option<u32>,
    #[ts(optional)]
    pub reciter_id: Option<String>,
    #[ts(optional)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    settings: Settings,
    reading_mode: ReadingMode,
}

impl Preferences {
    pub fn new(settings: Settings, reading_mode: ReadingMode) -> Self {
        let mut prefs = Self {
            settings,
            reading_mode,
        };
        prefs.settings.font_size = clamp_font_size(prefs.settings.font_size);
        prefs
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn reading_mode(&self) -> ReadingMode {
        self.reading_mode
    }

    pub fn set_reading_mode(&mut self, mode: ReadingMode) -> bool {
        if self.reading_mode == mode {
            return false;
        }
        info!(from = %self.reading_mode, to = %mode, "Reading mode changed");
        self.reading_mode = mode;
        true
    }

    /// Apply a partial update. Returns true if anything changed. A new reciter
    /// only affects subsequent fetches; live audio is left alone.
    pub fn update(&mut self, patch: SettingsPatch) -> bool {
        let before = self.settings.clone();
        if let Some(font) = patch.font.filter(|font| !font.trim().is_empty()) {
            self.settings.font = font.trim().to_string();
        }
        if let Some(size) = patch.font_size {
            self.settings.font_size = clamp_font_size(size);
        }
        if let Some(reciter) = patch.reciter_id.filter(|id| !id.trim().is_empty()) {
            self.settings.reciter_id = reciter.trim().to_string();
        }
        if let Some(language) = patch.language.filter(|lang| !lang.trim().is_empty()) {
            self.settings.language = language.trim().to_ascii_lowercase();
        }
        let changed = before != self.settings;
        if changed {
            debug!(settings = ?self.settings, "Settings updated");
        }
        changed
    }
}

fn clamp_font_size(size: u32) -> u32 {
    size.clamp(AppConfig::min_font_size(), AppConfig::max_font_size())
}
