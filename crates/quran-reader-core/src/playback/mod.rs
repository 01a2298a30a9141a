//! Per-verse recitation playback with optional auto-advance.
//!
//! The sequencer owns at most one live media handle. Every operation takes the
//! verse sequence as it is *now*, so a section swap between calls can never
//! leave the sequencer pointing into a sequence it no longer sees.

mod rodio_output;
mod transitions;

pub use rodio_output::RodioOutput;
pub use transitions::{PlaybackEvent, next_after_end};

use crate::error::ReaderError;
use crate::model::Verse;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use transitions::{PlaybackAction, transition};
use ts_rs::TS;

/// Observable state of one media handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaStatus {
    Loading,
    Playing,
    Paused,
    Ended,
    Failed(String),
}

/// A started audio stream. Dropping or stopping it releases the device.
pub trait MediaHandle {
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn status(&self) -> MediaStatus;
}

/// Backend that turns an audio reference into a playing handle.
pub trait AudioOutput {
    /// Start playback of `url` immediately. Loading may continue in the
    /// background; failures after this returns surface through `status`.
    fn open(&mut self, url: &str) -> Result<Box<dyn MediaHandle>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub current_index: Option<usize>,
    /// Last index that was started; survives pause and terminal resets.
    pub last_index: Option<usize>,
    pub playing: bool,
    pub auto_advance: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
}

struct LiveHandle {
    id: u64,
    index: usize,
    url: String,
    handle: Box<dyn MediaHandle>,
}

pub struct PlaybackSequencer {
    output: Box<dyn AudioOutput>,
    live: Option<LiveHandle>,
    state: PlaybackState,
    handle_seq: u64,
}

impl PlaybackSequencer {
    pub fn new(output: Box<dyn AudioOutput>) -> Self {
        Self {
            output,
            live: None,
            state: PlaybackState::default(),
            handle_seq: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        match (&self.live, self.state.playing) {
            (Some(_), true) => PlaybackStatus::Playing,
            (Some(_), false) => PlaybackStatus::Paused,
            (None, _) => PlaybackStatus::Idle,
        }
    }

    pub fn has_live_handle(&self) -> bool {
        self.live.is_some()
    }

    /// Percentage of the sequence reached by the current verse.
    pub fn progress_pct(&self, sequence_len: usize) -> f64 {
        match self.state.current_index {
            Some(idx) if sequence_len > 0 => {
                ((idx + 1).min(sequence_len) as f64 / sequence_len as f64) * 100.0
            }
            _ => 0.0,
        }
    }

    /// Start verse `index`. Returns `Ok(false)` when the index is outside the
    /// sequence; nothing changes in that case.
    pub fn play(
        &mut self,
        verses: &[Verse],
        index: usize,
        auto_advance: bool,
    ) -> Result<bool, ReaderError> {
        let Some(verse) = verses.get(index) else {
            debug!(
                index,
                len = verses.len(),
                "Rejecting play request outside the verse sequence"
            );
            return Ok(false);
        };

        self.release_live();
        match self.output.open(&verse.audio_url) {
            Ok(handle) => {
                self.handle_seq = self.handle_seq.wrapping_add(1);
                self.live = Some(LiveHandle {
                    id: self.handle_seq,
                    index,
                    url: verse.audio_url.clone(),
                    handle,
                });
                self.state = PlaybackState {
                    current_index: Some(index),
                    last_index: Some(index),
                    playing: true,
                    auto_advance,
                };
                info!(
                    index,
                    section = verse.section,
                    verse = verse.number,
                    auto_advance,
                    handle_id = self.handle_seq,
                    "Started verse playback"
                );
                Ok(true)
            }
            Err(err) => {
                warn!(index, url = %verse.audio_url, "Failed to start playback: {err:#}");
                self.state.last_index = Some(index);
                self.reset_to_terminal();
                Err(ReaderError::PlaybackFailed {
                    index,
                    reason: format!("{err:#}"),
                })
            }
        }
    }

    /// Pause the live handle. Keeps the index so a later resume picks up here.
    pub fn pause(&mut self) {
        let Some(live) = self.live.as_mut() else {
            debug!("Pause requested with nothing live");
            return;
        };
        live.handle.pause();
        self.state.playing = false;
        self.state.auto_advance = false;
        info!(index = live.index, "Paused verse playback");
    }

    /// Play with no explicit index: continue at the last index, or 0.
    pub fn resume(&mut self, verses: &[Verse]) -> Result<bool, ReaderError> {
        if self.state.playing {
            return Ok(true);
        }
        let target = self.resume_target(verses.len());
        self.resume_or_play(verses, target, false)
    }

    pub fn toggle_auto_advance(&mut self, verses: &[Verse]) -> Result<bool, ReaderError> {
        if self.state.auto_advance {
            self.pause();
            return Ok(true);
        }
        let target = self.resume_target(verses.len());
        self.resume_or_play(verses, target, true)
    }

    pub fn toggle_play_pause(&mut self, verses: &[Verse]) -> Result<bool, ReaderError> {
        if self.state.playing {
            self.pause();
            return Ok(true);
        }
        let target = self.resume_target(verses.len());
        let auto_advance = self.state.auto_advance;
        self.resume_or_play(verses, target, auto_advance)
    }

    pub fn skip_next(&mut self, verses: &[Verse]) -> Result<bool, ReaderError> {
        let Some(current) = self.state.current_index.or(self.state.last_index) else {
            return self.play(verses, 0, self.state.auto_advance);
        };
        self.play(verses, current.saturating_add(1), self.state.auto_advance)
    }

    pub fn skip_prev(&mut self, verses: &[Verse]) -> Result<bool, ReaderError> {
        match self.state.current_index.or(self.state.last_index) {
            Some(current) if current > 0 => {
                self.play(verses, current - 1, self.state.auto_advance)
            }
            _ => Ok(false),
        }
    }

    /// Release the live handle and enter the terminal state.
    pub fn stop(&mut self) {
        self.release_live();
        self.reset_to_terminal();
    }

    /// Turn the live handle's status into events and apply them.
    pub fn poll(&mut self, verses: &[Verse]) -> Result<(), ReaderError> {
        let Some(live) = self.live.as_ref() else {
            return Ok(());
        };
        let event = match live.handle.status() {
            MediaStatus::Ended => PlaybackEvent::Ended { handle_id: live.id },
            MediaStatus::Failed(reason) => PlaybackEvent::Failed {
                handle_id: live.id,
                reason,
            },
            MediaStatus::Loading | MediaStatus::Playing | MediaStatus::Paused => return Ok(()),
        };
        self.handle_event(verses, event)
    }

    pub fn handle_event(
        &mut self,
        verses: &[Verse],
        event: PlaybackEvent,
    ) -> Result<(), ReaderError> {
        let live = self.live.as_ref().map(|live| (live.id, live.index));
        for action in transition(&self.state, live, event, verses.len()) {
            match action {
                PlaybackAction::Play {
                    index,
                    auto_advance,
                } => {
                    if !self.play(verses, index, auto_advance)? {
                        self.stop();
                    }
                }
                PlaybackAction::Reset => {
                    info!("Verse sequence finished");
                    self.stop();
                }
                PlaybackAction::Fail { index, reason } => {
                    warn!(index, %reason, "Playback failed");
                    self.stop();
                    return Err(ReaderError::PlaybackFailed { index, reason });
                }
            }
        }
        Ok(())
    }

    fn resume_target(&self, sequence_len: usize) -> usize {
        self.state
            .last_index
            .filter(|idx| *idx < sequence_len)
            .unwrap_or(0)
    }

    fn resume_or_play(
        &mut self,
        verses: &[Verse],
        index: usize,
        auto_advance: bool,
    ) -> Result<bool, ReaderError> {
        let same_verse = verses.get(index).map(|verse| verse.audio_url.as_str());
        if let Some(live) = self.live.as_mut() {
            if live.index == index && Some(live.url.as_str()) == same_verse {
                live.handle.resume();
                self.state.current_index = Some(index);
                self.state.playing = true;
                self.state.auto_advance = auto_advance;
                info!(index, auto_advance, "Resumed verse playback");
                return Ok(true);
            }
        }
        self.play(verses, index, auto_advance)
    }

    fn release_live(&mut self) {
        if let Some(mut live) = self.live.take() {
            debug!(handle_id = live.id, index = live.index, "Releasing audio handle");
            live.handle.stop();
        }
    }

    fn reset_to_terminal(&mut self) {
        self.state.current_index = None;
        self.state.playing = false;
        self.state.auto_advance = false;
    }
}

impl Drop for PlaybackSequencer {
    fn drop(&mut self) {
        self.release_live();
    }
}
