//! Reference data and verse records returned by the content gateway.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Number of sections in the corpus.
pub const SECTION_COUNT: u32 = 114;
/// Number of equal cross-section groupings.
pub const GROUPING_COUNT: u32 = 30;

/// A single verse. `section` is always set, whichever fetch path produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Verse {
    pub number: u32,
    pub section: u32,
    pub global_number: u32,
    pub text: String,
    pub translation: String,
    #[ts(optional)]
    pub commentary: Option<String>,
    #[ts(optional)]
    pub transliteration: Option<String>,
    pub audio_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SectionSummary {
    pub number: u32,
    pub name: String,
    pub native_name: String,
    pub name_translation: String,
    pub verse_count: u32,
    pub revelation_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDetail {
    pub number: u32,
    pub name: String,
    pub native_name: String,
    pub name_translation: String,
    pub revelation_type: String,
    pub verses: Vec<Verse>,
}

impl SectionDetail {
    /// Summary of this section as shown alongside its verses.
    pub fn info(&self) -> SectionSummary {
        SectionSummary {
            number: self.number,
            name: self.name.clone(),
            native_name: self.native_name.clone(),
            name_translation: self.name_translation.clone(),
            verse_count: self.verses.len() as u32,
            revelation_type: self.revelation_type.clone(),
        }
    }
}

/// Which listing drives the active verse sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ActiveView {
    #[default]
    Section,
    Grouping,
}

impl std::fmt::Display for ActiveView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ActiveView::Section => "section",
            ActiveView::Grouping => "grouping",
        };
        write!(f, "{}", label)
    }
}
