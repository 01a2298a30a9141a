use crate::bookmarks::{Bookmark, BookmarkLedger};
use crate::config::AppConfig;
use crate::controller::{FetchRequest, FetchResponse, SelectionController};
use crate::error::ReaderError;
use crate::gateway::{ContentGateway, EditionSet};
use crate::model::{ActiveView, SectionSummary, Verse};
use crate::playback::{AudioOutput, PlaybackSequencer, PlaybackStatus};
use crate::preferences::{Preferences, ReadingMode, Settings, SettingsPatch};
use crate::store::{self, PersistedState};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ts_rs::TS;

const PLAYBACK_ERROR_MESSAGE: &str = "Failed to play audio";

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct VerseView {
    pub section: u32,
    pub number: u32,
    pub text: String,
    pub translation: Option<String>,
    pub commentary: Option<String>,
    pub transliteration: Option<String>,
    pub bookmarked: bool,
    pub note: Option<String>,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ReaderPlaybackView {
    pub status: PlaybackStatus,
    pub current_index: Option<usize>,
    pub auto_advance: bool,
    pub verse_count: usize,
    pub progress_pct: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ReaderSnapshot {
    pub active_view: ActiveView,
    pub current_section: u32,
    pub selected_grouping: u32,
    pub current_verse: u32,
    pub section_info: Option<SectionSummary>,
    pub verses: Vec<VerseView>,
    pub sections: Vec<SectionSummary>,
    pub search_query: String,
    pub is_loading: bool,
    pub error: Option<String>,
    pub playback: ReaderPlaybackView,
    pub playback_error: Option<String>,
    pub bookmarks: Vec<Bookmark>,
    pub settings: Settings,
    pub reading_mode: ReadingMode,
}

#[derive(Debug, Clone)]
pub enum SessionCommand {
    GetSnapshot,
    LoadSectionList,
    SelectSection { number: u32 },
    SelectGrouping { number: u32 },
    SetView { view: ActiveView },
    SetSearchFilter { query: String },
    SetCurrentVerse { verse: u32 },
    Play { index: Option<usize> },
    Pause,
    ToggleAutoAdvance,
    TogglePlayPause,
    SkipNext,
    SkipPrev,
    Stop,
    ToggleBookmark { section: u32, verse: u32, note: String },
    UpdateNote { section: u32, verse: u32, note: String },
    SaveNote { section: u32, verse: u32, note: String },
    SetReadingMode { mode: ReadingMode },
    ApplySettings { patch: SettingsPatch },
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "reader_get_snapshot",
            Self::LoadSectionList => "reader_load_section_list",
            Self::SelectSection { .. } => "reader_select_section",
            Self::SelectGrouping { .. } => "reader_select_grouping",
            Self::SetView { .. } => "reader_set_view",
            Self::SetSearchFilter { .. } => "reader_set_search_filter",
            Self::SetCurrentVerse { .. } => "reader_set_current_verse",
            Self::Play { .. } => "reader_play",
            Self::Pause => "reader_pause",
            Self::ToggleAutoAdvance => "reader_toggle_auto_advance",
            Self::TogglePlayPause => "reader_toggle_play_pause",
            Self::SkipNext => "reader_skip_next",
            Self::SkipPrev => "reader_skip_prev",
            Self::Stop => "reader_stop",
            Self::ToggleBookmark { .. } => "reader_toggle_bookmark",
            Self::UpdateNote { .. } => "reader_update_note",
            Self::SaveNote { .. } => "reader_save_note",
            Self::SetReadingMode { .. } => "reader_set_reading_mode",
            Self::ApplySettings { .. } => "reader_apply_settings",
        }
    }

    fn persists(&self) -> bool {
        matches!(
            self,
            Self::SetView { .. }
                | Self::ToggleBookmark { .. }
                | Self::UpdateNote { .. }
                | Self::SaveNote { .. }
                | Self::SetReadingMode { .. }
                | Self::ApplySettings { .. }
        )
    }
}

/// Result of a command: the new snapshot plus fetches the caller must run
/// and feed back through `on_fetch_complete`.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub action: &'static str,
    pub snapshot: ReaderSnapshot,
    pub fetches: Vec<FetchRequest>,
}

pub struct ReaderSession {
    config: AppConfig,
    gateway: Arc<dyn ContentGateway>,
    controller: SelectionController,
    preferences: Preferences,
    bookmarks: BookmarkLedger,
    sequencer: PlaybackSequencer,
    state_path: PathBuf,
    playback_error: Option<String>,
}

impl ReaderSession {
    /// Build a session from persisted state at `config.state_path`, falling
    /// back to defaults.
    pub fn open(
        config: AppConfig,
        gateway: Arc<dyn ContentGateway>,
        output: Box<dyn AudioOutput>,
    ) -> Self {
        let state_path = PathBuf::from(&config.state_path);
        let state = store::load_state_or_default(&state_path, &config);
        Self::restore(config, gateway, output, state, state_path)
    }

    pub fn restore(
        config: AppConfig,
        gateway: Arc<dyn ContentGateway>,
        output: Box<dyn AudioOutput>,
        state: PersistedState,
        state_path: PathBuf,
    ) -> Self {
        let controller = SelectionController::new(
            state.active_view,
            state.current_section,
            state.selected_grouping,
            config.discard_stale_responses,
        );
        let settings = state
            .settings
            .unwrap_or_else(|| Settings::from_config(&config));
        let preferences = Preferences::new(settings, state.reading_mode);
        let bookmarks = BookmarkLedger::from_records(state.bookmarks);
        info!(
            section = controller.current_section(),
            grouping = controller.selected_grouping(),
            view = %controller.active_view(),
            bookmarks = bookmarks.len(),
            "Restored reader session"
        );
        Self {
            config,
            gateway,
            controller,
            preferences,
            bookmarks,
            sequencer: PlaybackSequencer::new(output),
            state_path,
            playback_error: None,
        }
    }

    pub fn gateway(&self) -> Arc<dyn ContentGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fetches needed right after startup: the section list and whatever the
    /// restored view shows.
    pub fn startup_requests(&mut self) -> Vec<FetchRequest> {
        let editions = self.editions();
        vec![
            self.controller.begin_load_section_list(editions.clone()),
            self.controller.begin_reload(editions),
        ]
    }

    pub fn snapshot(&self) -> ReaderSnapshot {
        let verses = self.controller.verses();
        let state = self.sequencer.state();
        let mode = self.preferences.reading_mode();
        ReaderSnapshot {
            active_view: self.controller.active_view(),
            current_section: self.controller.current_section(),
            selected_grouping: self.controller.selected_grouping(),
            current_verse: self.controller.current_verse,
            section_info: self.controller.section_info().cloned(),
            verses: verses
                .iter()
                .enumerate()
                .map(|(idx, verse)| self.verse_view(verse, mode, state.current_index == Some(idx)))
                .collect(),
            sections: self.controller.filtered_sections().to_vec(),
            search_query: self.controller.search_query.clone(),
            is_loading: self.controller.is_loading(),
            error: self.controller.error().map(str::to_string),
            playback: ReaderPlaybackView {
                status: self.sequencer.status(),
                current_index: state.current_index,
                auto_advance: state.auto_advance,
                verse_count: verses.len(),
                progress_pct: self.sequencer.progress_pct(verses.len()),
            },
            playback_error: self.playback_error.clone(),
            bookmarks: self.bookmarks.to_records(),
            settings: self.preferences.settings().clone(),
            reading_mode: mode,
        }
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> SessionEvent {
        let action = command.action();
        let persists = command.persists();
        let mut fetches = Vec::new();
        match command {
            SessionCommand::GetSnapshot => {}
            SessionCommand::LoadSectionList => {
                let editions = self.editions();
                fetches.push(self.controller.begin_load_section_list(editions));
            }
            SessionCommand::SelectSection { number } => {
                let editions = self.editions();
                fetches.push(self.controller.begin_select_section(number, editions));
            }
            SessionCommand::SelectGrouping { number } => {
                let editions = self.editions();
                fetches.push(self.controller.begin_select_grouping(number, editions));
            }
            SessionCommand::SetView { view } => {
                let editions = self.editions();
                fetches.push(self.controller.begin_set_view(view, editions));
            }
            SessionCommand::SetSearchFilter { query } => {
                self.controller.set_search_filter(&query);
            }
            SessionCommand::SetCurrentVerse { verse } => self.controller.set_current_verse(verse),
            SessionCommand::Play { index } => {
                let verses = self.controller.verses();
                let result = match index {
                    Some(index) => self.sequencer.play(verses, index, false),
                    None => self.sequencer.resume(verses),
                };
                self.record_playback(result);
            }
            SessionCommand::Pause => self.sequencer.pause(),
            SessionCommand::ToggleAutoAdvance => {
                let result = self.sequencer.toggle_auto_advance(self.controller.verses());
                self.record_playback(result);
            }
            SessionCommand::TogglePlayPause => {
                let result = self.sequencer.toggle_play_pause(self.controller.verses());
                self.record_playback(result);
            }
            SessionCommand::SkipNext => {
                let result = self.sequencer.skip_next(self.controller.verses());
                self.record_playback(result);
            }
            SessionCommand::SkipPrev => {
                let result = self.sequencer.skip_prev(self.controller.verses());
                self.record_playback(result);
            }
            SessionCommand::Stop => self.sequencer.stop(),
            SessionCommand::ToggleBookmark {
                section,
                verse,
                note,
            } => {
                self.bookmarks.toggle(section, verse, &note);
            }
            SessionCommand::UpdateNote {
                section,
                verse,
                note,
            } => {
                if let Err(err) = self.bookmarks.update_note(section, verse, &note) {
                    warn!("Ignoring note update: {err}");
                }
            }
            SessionCommand::SaveNote {
                section,
                verse,
                note,
            } => self.bookmarks.save_note(section, verse, &note),
            SessionCommand::SetReadingMode { mode } => {
                let needed_transliteration =
                    self.preferences.reading_mode().shows_transliteration();
                if self.preferences.set_reading_mode(mode)
                    && needed_transliteration != mode.shows_transliteration()
                {
                    let editions = self.editions();
                    fetches.push(self.controller.begin_reload(editions));
                }
            }
            SessionCommand::ApplySettings { patch } => {
                let before = self.editions();
                if self.preferences.update(patch) {
                    let after = self.editions();
                    if before != after {
                        debug!(?after, "Editions changed; reloading content");
                        fetches.push(self.controller.begin_reload(after));
                    }
                }
            }
        }
        self.sync_current_verse();
        if persists {
            self.persist();
        }
        SessionEvent {
            action,
            snapshot: self.snapshot(),
            fetches,
        }
    }

    pub fn on_fetch_complete(&mut self, response: FetchResponse) -> SessionEvent {
        let before = (
            self.controller.current_section(),
            self.controller.selected_grouping(),
        );
        if self.controller.complete(response) {
            let after = (
                self.controller.current_section(),
                self.controller.selected_grouping(),
            );
            if before != after {
                self.persist();
            }
        }
        SessionEvent {
            action: "reader_fetch_complete",
            snapshot: self.snapshot(),
            fetches: Vec::new(),
        }
    }

    /// Drive playback forward. Returns true when playback state changed.
    pub fn tick(&mut self) -> bool {
        let before = (self.sequencer.state(), self.sequencer.status());
        let result = self.sequencer.poll(self.controller.verses());
        self.record_playback(result.map(|()| false));
        self.sync_current_verse();
        before != (self.sequencer.state(), self.sequencer.status())
    }

    pub fn persist(&self) {
        let state = PersistedState {
            current_section: self.controller.current_section(),
            selected_grouping: self.controller.selected_grouping(),
            active_view: self.controller.active_view(),
            reading_mode: self.preferences.reading_mode(),
            settings: Some(self.preferences.settings().clone()),
            bookmarks: self.bookmarks.to_records(),
        };
        store::save_state(&self.state_path, &state);
    }

    /// Release audio and write state. Safe to call more than once.
    pub fn shutdown(&mut self) {
        info!("Shutting down reader session");
        self.sequencer.stop();
        self.persist();
    }

    fn editions(&self) -> EditionSet {
        EditionSet::resolve(&self.config, &self.preferences)
    }

    fn record_playback(&mut self, result: Result<bool, ReaderError>) {
        match result {
            Ok(true) => self.playback_error = None,
            Ok(false) => {}
            Err(err) => {
                warn!("{err}");
                self.playback_error = Some(PLAYBACK_ERROR_MESSAGE.to_string());
            }
        }
    }

    fn sync_current_verse(&mut self) {
        let Some(idx) = self.sequencer.state().current_index else {
            return;
        };
        if let Some(number) = self.controller.verses().get(idx).map(|verse| verse.number) {
            self.controller.set_current_verse(number);
        }
    }

    fn verse_view(&self, verse: &Verse, mode: ReadingMode, is_current: bool) -> VerseView {
        let bookmark = self.bookmarks.get(verse.section, verse.number);
        VerseView {
            section: verse.section,
            number: verse.number,
            text: verse.text.clone(),
            translation: mode.shows_translation().then(|| verse.translation.clone()),
            commentary: verse
                .commentary
                .clone()
                .filter(|_| mode.shows_translation()),
            transliteration: verse
                .transliteration
                .clone()
                .filter(|_| mode.shows_transliteration()),
            bookmarked: bookmark.is_some(),
            note: bookmark
                .map(|bookmark| bookmark.note.clone())
                .filter(|note| !note.is_empty()),
            is_current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::model::SectionDetail;
    use crate::playback::testing::{FakeDevice, FakeOutput};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeGateway {
        failing_sections: HashSet<u32>,
        requested: Mutex<Vec<EditionSet>>,
    }

    fn fake_verse(section: u32, number: u32, editions: &EditionSet) -> Verse {
        Verse {
            number,
            section,
            global_number: section * 1000 + number,
            text: format!("text {section}:{number}"),
            translation: format!("{} {section}:{number}", editions.translation),
            commentary: None,
            transliteration: editions
                .transliteration
                .as_ref()
                .map(|_| format!("translit {section}:{number}")),
            audio_url: format!("https://cdn.test/{}/{section}/{number}.mp3", editions.recitation),
        }
    }

    impl ContentGateway for FakeGateway {
        fn fetch_section(
            &self,
            number: u32,
            editions: &EditionSet,
        ) -> Result<SectionDetail, FetchError> {
            if let Ok(mut requested) = self.requested.lock() {
                requested.push(editions.clone());
            }
            if self.failing_sections.contains(&number) {
                return Err(FetchError::Status {
                    url: format!("surah/{number}"),
                    status: 500,
                });
            }
            Ok(SectionDetail {
                number,
                name: format!("Section {number}"),
                native_name: String::new(),
                name_translation: String::new(),
                revelation_type: "Meccan".to_string(),
                verses: (1..=3).map(|n| fake_verse(0, n, editions)).collect(),
            })
        }

        fn fetch_grouping(
            &self,
            number: u32,
            editions: &EditionSet,
        ) -> Result<Vec<Verse>, FetchError> {
            Ok(vec![
                fake_verse(number + 1, 5, editions),
                fake_verse(number + 2, 1, editions),
            ])
        }

        fn fetch_section_list(&self) -> Result<Vec<SectionSummary>, FetchError> {
            Ok(vec![SectionSummary {
                number: 1,
                name: "Al-Fatihah".to_string(),
                native_name: String::new(),
                name_translation: "The Opening".to_string(),
                verse_count: 7,
                revelation_type: "Meccan".to_string(),
            }])
        }
    }

    struct Harness {
        session: ReaderSession,
        device: Rc<RefCell<FakeDevice>>,
        gateway: Arc<FakeGateway>,
        _dir: TempDir,
        state_path: PathBuf,
    }

    fn harness_with(gateway: FakeGateway) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let state_path = dir.path().join("state.toml");
        let config = AppConfig {
            state_path: state_path.to_string_lossy().into_owned(),
            ..AppConfig::default()
        };
        let device = Rc::new(RefCell::new(FakeDevice::default()));
        let gateway = Arc::new(gateway);
        let session = ReaderSession::open(
            config,
            gateway.clone(),
            Box::new(FakeOutput(Rc::clone(&device))),
        );
        Harness {
            session,
            device,
            gateway,
            _dir: dir,
            state_path,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeGateway::default())
    }

    impl Harness {
        fn run(&mut self, command: SessionCommand) -> ReaderSnapshot {
            let event = self.session.apply_command(command);
            let mut snapshot = event.snapshot;
            for request in event.fetches {
                let response = request.execute(self.gateway.as_ref());
                snapshot = self.session.on_fetch_complete(response).snapshot;
            }
            snapshot
        }
    }

    #[test]
    fn startup_loads_list_and_restored_section() {
        let mut h = harness();
        for request in h.session.startup_requests() {
            let response = request.execute(h.gateway.as_ref());
            h.session.on_fetch_complete(response);
        }
        let snapshot = h.session.snapshot();
        assert_eq!(snapshot.sections.len(), 1);
        assert_eq!(snapshot.verses.len(), 3);
        assert!(!snapshot.is_loading);
    }

    #[test]
    fn section_verses_carry_their_section_and_play_in_order() {
        let mut h = harness();
        let snapshot = h.run(SessionCommand::SelectSection { number: 2 });
        assert!(snapshot.verses.iter().all(|v| v.section == 2));

        let snapshot = h.run(SessionCommand::ToggleAutoAdvance);
        assert_eq!(snapshot.playback.status, PlaybackStatus::Playing);
        assert_eq!(snapshot.playback.current_index, Some(0));

        h.device.borrow_mut().finish(0);
        assert!(h.session.tick());
        let snapshot = h.session.snapshot();
        assert_eq!(snapshot.playback.current_index, Some(1));
        assert_eq!(snapshot.current_verse, 2);
        assert_eq!(h.device.borrow().live_count(), 1);
    }

    #[test]
    fn failed_section_keeps_previous_content() {
        let mut h = harness_with(FakeGateway {
            failing_sections: HashSet::from([9]),
            ..FakeGateway::default()
        });
        h.run(SessionCommand::SelectSection { number: 2 });
        let snapshot = h.run(SessionCommand::SelectSection { number: 9 });
        assert_eq!(snapshot.current_section, 2);
        assert_eq!(snapshot.verses.len(), 3);
        assert_eq!(snapshot.error.as_deref(), Some("Failed to load section"));
        assert!(!snapshot.is_loading);
    }

    #[test]
    fn playback_failure_surfaces_generic_message() {
        let mut h = harness();
        h.run(SessionCommand::SelectSection { number: 1 });
        h.device.borrow_mut().fail_next_open = true;
        let snapshot = h.run(SessionCommand::Play { index: Some(0) });
        assert_eq!(snapshot.playback_error.as_deref(), Some(PLAYBACK_ERROR_MESSAGE));
        assert_eq!(snapshot.playback.status, PlaybackStatus::Idle);

        let snapshot = h.run(SessionCommand::Play { index: Some(1) });
        assert_eq!(snapshot.playback_error, None);
        assert_eq!(snapshot.playback.status, PlaybackStatus::Playing);
    }

    #[test]
    fn out_of_range_play_is_ignored() {
        let mut h = harness();
        h.run(SessionCommand::SelectSection { number: 1 });
        let snapshot = h.run(SessionCommand::Play { index: Some(40) });
        assert_eq!(snapshot.playback.status, PlaybackStatus::Idle);
        assert!(h.device.borrow().opened.is_empty());
    }

    #[test]
    fn bookmarks_persist_across_sessions() {
        let mut h = harness();
        h.run(SessionCommand::SelectGrouping { number: 3 });
        let snapshot = h.run(SessionCommand::ToggleBookmark {
            section: 4,
            verse: 5,
            note: "revisit".to_string(),
        });
        assert!(snapshot.verses[0].bookmarked);
        assert_eq!(snapshot.verses[0].note.as_deref(), Some("revisit"));

        let restored = store::load_state(&h.state_path).expect("state written");
        assert_eq!(restored.bookmarks.len(), 1);
        assert_eq!(restored.selected_grouping, 3);

        h.run(SessionCommand::UpdateNote {
            section: 4,
            verse: 5,
            note: "done".to_string(),
        });
        let restored = store::load_state(&h.state_path).expect("state written");
        assert_eq!(restored.bookmarks[0].note, "done");
    }

    #[test]
    fn save_note_creates_then_updates_a_bookmark() {
        let mut h = harness();
        let snapshot = h.run(SessionCommand::SaveNote {
            section: 18,
            verse: 10,
            note: "first".to_string(),
        });
        assert_eq!(snapshot.bookmarks.len(), 1);
        assert_eq!(snapshot.bookmarks[0].note, "first");
        let created = snapshot.bookmarks[0].timestamp;

        let snapshot = h.run(SessionCommand::SaveNote {
            section: 18,
            verse: 10,
            note: "second".to_string(),
        });
        assert_eq!(snapshot.bookmarks.len(), 1);
        assert_eq!(snapshot.bookmarks[0].note, "second");
        assert_eq!(snapshot.bookmarks[0].timestamp, created);

        let restored = store::load_state(&h.state_path).expect("state written");
        assert_eq!(restored.bookmarks[0].note, "second");
    }

    #[test]
    fn switching_view_is_persisted() {
        let mut h = harness();
        let snapshot = h.run(SessionCommand::SetView {
            view: ActiveView::Grouping,
        });
        assert_eq!(snapshot.active_view, ActiveView::Grouping);
        assert_eq!(snapshot.verses.len(), 2);

        let restored = store::load_state(&h.state_path).expect("state written");
        assert_eq!(restored.active_view, ActiveView::Grouping);
    }

    #[test]
    fn stop_goes_terminal_and_resume_restarts_last_verse() {
        let mut h = harness();
        h.run(SessionCommand::SelectSection { number: 1 });
        h.run(SessionCommand::Play { index: Some(1) });

        let snapshot = h.run(SessionCommand::Stop);
        assert_eq!(snapshot.playback.status, PlaybackStatus::Idle);
        assert_eq!(snapshot.playback.current_index, None);
        assert_eq!(h.device.borrow().live_count(), 0);

        let snapshot = h.run(SessionCommand::Play { index: None });
        assert_eq!(snapshot.playback.current_index, Some(1));
        assert_eq!(h.device.borrow().opened.len(), 2);
    }

    #[test]
    fn note_update_for_missing_bookmark_is_a_no_op() {
        let mut h = harness();
        let snapshot = h.run(SessionCommand::UpdateNote {
            section: 1,
            verse: 1,
            note: "nothing here".to_string(),
        });
        assert!(snapshot.bookmarks.is_empty());
    }

    #[test]
    fn transliteration_mode_refetches_with_transliteration_edition() {
        let mut h = harness();
        h.run(SessionCommand::SelectSection { number: 1 });
        let snapshot = h.run(SessionCommand::SetReadingMode {
            mode: ReadingMode::WithTranslationAndTransliteration,
        });
        assert!(snapshot.verses[0].transliteration.is_some());
        let requested = h.gateway.requested.lock().expect("lock");
        assert!(requested.last().is_some_and(|e| e.transliteration.is_some()));
    }

    #[test]
    fn script_only_mode_hides_translation() {
        let mut h = harness();
        h.run(SessionCommand::SelectSection { number: 1 });
        let snapshot = h.run(SessionCommand::SetReadingMode {
            mode: ReadingMode::ScriptOnly,
        });
        assert!(snapshot.verses.iter().all(|v| v.translation.is_none()));
    }

    #[test]
    fn reciter_change_keeps_audio_and_reloads_content() {
        let mut h = harness();
        h.run(SessionCommand::SelectSection { number: 1 });
        h.run(SessionCommand::Play { index: Some(0) });
        let snapshot = h.run(SessionCommand::ApplySettings {
            patch: SettingsPatch {
                reciter_id: Some("ar.husary".to_string()),
                ..SettingsPatch::default()
            },
        });
        assert_eq!(snapshot.playback.status, PlaybackStatus::Playing);
        assert_eq!(h.device.borrow().live_count(), 1);
        let requested = h.gateway.requested.lock().expect("lock");
        assert_eq!(
            requested.last().map(|e| e.recitation.as_str()),
            Some("ar.husary")
        );
    }

    #[test]
    fn shutdown_releases_audio() {
        let mut h = harness();
        h.run(SessionCommand::SelectSection { number: 1 });
        h.run(SessionCommand::Play { index: Some(0) });
        h.session.shutdown();
        assert_eq!(h.device.borrow().live_count(), 0);
        assert!(h.state_path.exists());
    }
}
