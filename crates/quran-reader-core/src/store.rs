//! Local persistence for bookmarks, the last selection and preferences.
//!
//! State lives in a single TOML file (default `.cache/state.toml`). Reads fall
//! back to defaults on any problem and writes never interrupt the reader.

use crate::bookmarks::Bookmark;
use crate::config::AppConfig;
use crate::model::ActiveView;
use crate::preferences::{ReadingMode, Settings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default = "default_section")]
    pub current_section: u32,
    #[serde(default = "default_grouping")]
    pub selected_grouping: u32,
    #[serde(default)]
    pub active_view: ActiveView,
    #[serde(default)]
    pub reading_mode: ReadingMode,
    /// Missing from partial or hand-edited files.
    #[serde(default)]
    pub settings: Option<Settings>,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

impl PersistedState {
    pub fn defaults(config: &AppConfig) -> Self {
        Self {
            current_section: default_section(),
            selected_grouping: default_grouping(),
            active_view: ActiveView::default(),
            reading_mode: ReadingMode::default(),
            settings: Some(Settings::from_config(config)),
            bookmarks: Vec::new(),
        }
    }
}

fn default_section() -> u32 {
    1
}

fn default_grouping() -> u32 {
    1
}

/// Load persisted state, if present and readable.
pub fn load_state(path: &Path) -> Option<PersistedState> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            debug!(path = %path.display(), "No persisted state: {err}");
            return None;
        }
    };
    match toml::from_str::<PersistedState>(&data) {
        Ok(state) => {
            info!(
                path = %path.display(),
                bookmarks = state.bookmarks.len(),
                section = state.current_section,
                "Restored persisted state"
            );
            Some(state)
        }
        Err(err) => {
            warn!(path = %path.display(), "Ignoring unreadable state file: {err}");
            None
        }
    }
}

/// Load persisted state, filling anything missing from `config`.
pub fn load_state_or_default(path: &Path, config: &AppConfig) -> PersistedState {
    let mut state = load_state(path).unwrap_or_else(|| PersistedState::defaults(config));
    if state.settings.is_none() {
        state.settings = Some(Settings::from_config(config));
    }
    state
}

/// Persist state. Errors are logged rather than returned to keep commands
/// responsive.
pub fn save_state(path: &Path, state: &PersistedState) {
    if let Err(err) = write_state(path, state) {
        warn!(path = %path.display(), "Failed to persist state: {err:#}");
    }
}

fn write_state(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating {}", parent.display()))?;
    }
    let contents = toml::to_string(state).context("Serializing state")?;
    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, contents).with_context(|| format!("Writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Replacing {}", path.display()))?;
    debug!(path = %path.display(), "Persisted state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_survives_a_save_load_cycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("state.toml");
        let mut state = PersistedState::defaults(&AppConfig::default());
        state.current_section = 36;
        state.active_view = ActiveView::Grouping;
        state.selected_grouping = 30;
        state.reading_mode = ReadingMode::ScriptOnly;
        state.bookmarks.push(Bookmark {
            section: 36,
            verse: 58,
            note: "peace".to_string(),
            timestamp: 1_700_000_000,
        });

        save_state(&path, &state);

        assert_eq!(load_state(&path), Some(state));
    }

    #[test]
    fn missing_or_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.toml");
        let config = AppConfig::default();
        assert_eq!(load_state_or_default(&path, &config), PersistedState::defaults(&config));

        fs::write(&path, "bookmarks = 12").expect("write");
        assert_eq!(load_state(&path), None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.toml");
        fs::write(
            &path,
            r#"
            reading_mode = "with-translation-and-transliteration"

            [settings]
            font = "scheherazade"
            font_size = 30
            reciter_id = "ar.husary"
            language = "en"
            "#,
        )
        .expect("write");

        let state = load_state(&path).expect("parses");

        assert_eq!(state.current_section, 1);
        assert_eq!(state.active_view, ActiveView::Section);
        assert_eq!(state.reading_mode, ReadingMode::WithTranslationAndTransliteration);
        assert_eq!(
            state.settings.as_ref().map(|s| s.reciter_id.as_str()),
            Some("ar.husary")
        );
        assert!(state.bookmarks.is_empty());
    }

    #[test]
    fn bookmarks_survive_a_file_without_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.toml");
        fs::write(
            &path,
            r#"
            current_section = 2

            [[bookmarks]]
            section = 2
            verse = 255
            note = "kursi"
            timestamp = 1700000000
            "#,
        )
        .expect("write");
        let config = AppConfig::default();

        let state = load_state_or_default(&path, &config);

        assert_eq!(state.current_section, 2);
        assert_eq!(state.bookmarks.len(), 1);
        assert_eq!(state.bookmarks[0].note, "kursi");
        assert_eq!(state.settings, Some(Settings::from_config(&config)));
    }
}
