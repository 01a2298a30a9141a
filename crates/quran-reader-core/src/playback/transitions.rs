use super::PlaybackState;
use tracing::debug;

/// Asynchronous completions reported by a live media handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Ended { handle_id: u64 },
    Failed { handle_id: u64, reason: String },
}

/// Work the sequencer must perform in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum PlaybackAction {
    Play { index: usize, auto_advance: bool },
    Reset,
    Fail { index: usize, reason: String },
}

/// The single place where "what comes after this verse" is decided.
pub fn next_after_end(index: usize, auto_advance: bool, sequence_len: usize) -> Option<usize> {
    let next = index.checked_add(1)?;
    (auto_advance && next < sequence_len).then_some(next)
}

/// `live` is the id and verse index of the handle currently owned by the
/// sequencer; events for any other handle are stale and ignored.
pub(super) fn transition(
    state: &PlaybackState,
    live: Option<(u64, usize)>,
    event: PlaybackEvent,
    sequence_len: usize,
) -> Vec<PlaybackAction> {
    let handle_id = match &event {
        PlaybackEvent::Ended { handle_id } | PlaybackEvent::Failed { handle_id, .. } => *handle_id,
    };
    let Some((live_id, index)) = live.filter(|(live_id, _)| *live_id == handle_id) else {
        debug!(
            handle_id,
            live = ?live.map(|(id, _)| id),
            "Ignoring event for a handle that is no longer live"
        );
        return Vec::new();
    };

    match event {
        PlaybackEvent::Ended { .. } => {
            match next_after_end(index, state.auto_advance, sequence_len) {
                Some(next) => {
                    debug!(handle_id = live_id, from = index, to = next, "Auto-advancing");
                    vec![PlaybackAction::Play {
                        index: next,
                        auto_advance: true,
                    }]
                }
                None => vec![PlaybackAction::Reset],
            }
        }
        PlaybackEvent::Failed { reason, .. } => vec![PlaybackAction::Fail { index, reason }],
    }
}
