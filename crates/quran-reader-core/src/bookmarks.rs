//! Bookmark ledger: at most one bookmark per (section, verse), toggled on and
//! off by the same control that carries the note.

use crate::error::ReaderError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bookmark {
    pub section: u32,
    pub verse: u32,
    #[serde(default)]
    pub note: String,
    /// Unix seconds of creation.
    #[serde(default)]
    pub timestamp: u64,
}

impl Bookmark {
    pub fn key(&self) -> (u32, u32) {
        (self.section, self.verse)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookmarkLedger {
    entries: Vec<Bookmark>,
    index: HashMap<(u32, u32), usize>,
}

impl BookmarkLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records. Later duplicates of a key are
    /// dropped so the uniqueness invariant holds even for hand-edited files.
    pub fn from_records(records: Vec<Bookmark>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            if ledger.contains(record.section, record.verse) {
                debug!(
                    section = record.section,
                    verse = record.verse,
                    "Dropping duplicate persisted bookmark"
                );
                continue;
            }
            ledger.insert(record);
        }
        ledger
    }

    /// Flip presence for a key. Returns true if the bookmark now exists.
    pub fn toggle(&mut self, section: u32, verse: u32, note: &str) -> bool {
        self.toggle_at(section, verse, note, now_unix_secs())
    }

    pub fn toggle_at(&mut self, section: u32, verse: u32, note: &str, timestamp: u64) -> bool {
        if self.remove(section, verse).is_some() {
            info!(section, verse, "Removed bookmark");
            return false;
        }
        self.insert(Bookmark {
            section,
            verse,
            note: note.to_string(),
            timestamp,
        });
        info!(section, verse, has_note = !note.is_empty(), "Added bookmark");
        true
    }

    /// Replace the note of an existing bookmark; the timestamp is kept.
    pub fn update_note(&mut self, section: u32, verse: u32, note: &str) -> Result<(), ReaderError> {
        let Some(&idx) = self.index.get(&(section, verse)) else {
            return Err(ReaderError::InvalidBookmarkOperation { section, verse });
        };
        self.entries[idx].note = note.to_string();
        debug!(section, verse, "Updated bookmark note");
        Ok(())
    }

    /// Update the note when bookmarked, otherwise create the bookmark with it.
    pub fn save_note(&mut self, section: u32, verse: u32, note: &str) {
        if self.update_note(section, verse, note).is_err() {
            self.toggle(section, verse, note);
        }
    }

    pub fn get(&self, section: u32, verse: u32) -> Option<&Bookmark> {
        self.index
            .get(&(section, verse))
            .map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, section: u32, verse: u32) -> bool {
        self.index.contains_key(&(section, verse))
    }

    /// Bookmarks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> {
        self.entries.iter()
    }

    pub fn to_records(&self) -> Vec<Bookmark> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, bookmark: Bookmark) {
        self.index.insert(bookmark.key(), self.entries.len());
        self.entries.push(bookmark);
    }

    fn remove(&mut self, section: u32, verse: u32) -> Option<Bookmark> {
        let idx = self.index.remove(&(section, verse))?;
        let removed = self.entries.remove(idx);
        for (pos, entry) in self.entries.iter().enumerate().skip(idx) {
            self.index.insert(entry.key(), pos);
        }
        Some(removed)
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_toggle_restores_absence() {
        let mut ledger = BookmarkLedger::new();
        ledger.toggle_at(2, 255, "", 10);
        let before = ledger.to_records();

        assert!(ledger.toggle_at(1, 1, "opening", 20));
        assert!(!ledger.toggle_at(1, 1, "ignored on removal", 30));

        assert_eq!(ledger.to_records(), before);
        assert!(!ledger.contains(1, 1));
    }

    #[test]
    fn update_note_changes_only_the_note() {
        let mut ledger = BookmarkLedger::new();
        ledger.toggle_at(18, 10, "cave", 42);

        ledger.update_note(18, 10, "the cave").expect("bookmark exists");

        let bookmark = ledger.get(18, 10).expect("still present");
        assert_eq!(bookmark.note, "the cave");
        assert_eq!(bookmark.key(), (18, 10));
        assert_eq!(bookmark.timestamp, 42);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn update_note_on_missing_key_is_rejected() {
        let mut ledger = BookmarkLedger::new();
        let err = ledger.update_note(3, 7, "nope").unwrap_err();
        assert!(matches!(
            err,
            ReaderError::InvalidBookmarkOperation { section: 3, verse: 7 }
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn keys_stay_unique_across_mixed_operations() {
        let mut ledger = BookmarkLedger::new();
        let ops: &[(u32, u32)] = &[(1, 1), (1, 2), (1, 1), (2, 1), (1, 1), (1, 2), (2, 1), (2, 1)];
        for (step, &(section, verse)) in ops.iter().enumerate() {
            if step % 3 == 0 {
                let _ = ledger.update_note(section, verse, "n");
            }
            ledger.toggle_at(section, verse, "", step as u64);
            let mut keys: Vec<_> = ledger.iter().map(Bookmark::key).collect();
            let total = keys.len();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), total);
        }
        let keys: Vec<_> = ledger.iter().map(Bookmark::key).collect();
        assert_eq!(keys, vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn removal_keeps_lookup_consistent_with_order() {
        let mut ledger = BookmarkLedger::new();
        ledger.toggle_at(1, 1, "a", 1);
        ledger.toggle_at(1, 2, "b", 2);
        ledger.toggle_at(1, 3, "c", 3);

        ledger.toggle_at(1, 1, "", 4);

        assert_eq!(ledger.get(1, 3).map(|b| b.note.as_str()), Some("c"));
        assert_eq!(ledger.get(1, 2).map(|b| b.note.as_str()), Some("b"));
        let order: Vec<_> = ledger.iter().map(|b| b.verse).collect();
        assert_eq!(order, vec![2, 3]);
    }

    #[test]
    fn save_note_inserts_then_updates() {
        let mut ledger = BookmarkLedger::new();
        ledger.save_note(36, 1, "first");
        ledger.save_note(36, 1, "second");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(36, 1).map(|b| b.note.as_str()), Some("second"));
    }

    #[test]
    fn restoring_collapses_duplicate_keys() {
        let records = vec![
            Bookmark { section: 1, verse: 1, note: "keep".into(), timestamp: 1 },
            Bookmark { section: 1, verse: 1, note: "drop".into(), timestamp: 2 },
        ];
        let ledger = BookmarkLedger::from_records(records);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(1, 1).map(|b| b.note.as_str()), Some("keep"));
    }
}
