//! Chapter / grouping / search selection.
//!
//! Every fetch goes Idle → Loading → {Ready | Failed}. Starting one returns a
//! `FetchRequest` for the runtime to execute; its `FetchResponse` is fed back
//! through `complete`, which installs the result in one step.

use crate::error::FetchError;
use crate::gateway::{ContentGateway, EditionSet};
use crate::model::{ActiveView, GROUPING_COUNT, SECTION_COUNT, SectionDetail, SectionSummary, Verse};
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    SelectSection,
    SelectGrouping,
    SwitchView,
    SectionList,
}

impl FetchPurpose {
    fn failure_message(self) -> &'static str {
        match self {
            FetchPurpose::SelectSection => "Failed to load section",
            FetchPurpose::SelectGrouping => "Failed to load grouping",
            FetchPurpose::SwitchView => "Failed to load content",
            FetchPurpose::SectionList => "Failed to load section list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    Section(u32),
    Grouping(u32),
    SectionList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub request_id: u64,
    pub purpose: FetchPurpose,
    pub target: FetchTarget,
    pub editions: EditionSet,
}

#[derive(Debug)]
pub enum FetchPayload {
    Section(SectionDetail),
    Grouping(Vec<Verse>),
    SectionList(Vec<SectionSummary>),
}

#[derive(Debug)]
pub struct FetchResponse {
    pub request_id: u64,
    pub purpose: FetchPurpose,
    pub target: FetchTarget,
    pub result: Result<FetchPayload, FetchError>,
}

impl FetchRequest {
    /// Run the request against the gateway. Blocking; call off the UI thread.
    pub fn execute(&self, gateway: &dyn ContentGateway) -> FetchResponse {
        let result = match self.target {
            FetchTarget::Section(number) => gateway
                .fetch_section(number, &self.editions)
                .map(FetchPayload::Section),
            FetchTarget::Grouping(number) => gateway
                .fetch_grouping(number, &self.editions)
                .map(FetchPayload::Grouping),
            FetchTarget::SectionList => gateway.fetch_section_list().map(FetchPayload::SectionList),
        };
        FetchResponse {
            request_id: self.request_id,
            purpose: self.purpose,
            target: self.target,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    pub(crate) active_view: ActiveView,
    pub(crate) current_section: u32,
    pub(crate) selected_grouping: u32,
    pub(crate) current_verse: u32,
    pub(crate) current_verses: Vec<Verse>,
    pub(crate) section_info: Option<SectionSummary>,
    pub(crate) sections: Vec<SectionSummary>,
    pub(crate) filtered_sections: Vec<SectionSummary>,
    pub(crate) search_query: String,
    pub(crate) is_loading: bool,
    pub(crate) error: Option<String>,
    discard_stale: bool,
    request_seq: u64,
    latest_content_request: u64,
    latest_list_request: u64,
}

impl SelectionController {
    pub fn new(
        active_view: ActiveView,
        current_section: u32,
        selected_grouping: u32,
        discard_stale: bool,
    ) -> Self {
        Self {
            active_view,
            current_section: current_section.clamp(1, SECTION_COUNT),
            selected_grouping: selected_grouping.clamp(1, GROUPING_COUNT),
            current_verse: 1,
            current_verses: Vec::new(),
            section_info: None,
            sections: Vec::new(),
            filtered_sections: Vec::new(),
            search_query: String::new(),
            is_loading: false,
            error: None,
            discard_stale,
            request_seq: 0,
            latest_content_request: 0,
            latest_list_request: 0,
        }
    }

    pub fn verses(&self) -> &[Verse] {
        &self.current_verses
    }

    pub fn active_view(&self) -> ActiveView {
        self.active_view
    }

    pub fn current_section(&self) -> u32 {
        self.current_section
    }

    pub fn selected_grouping(&self) -> u32 {
        self.selected_grouping
    }

    pub fn section_info(&self) -> Option<&SectionSummary> {
        self.section_info.as_ref()
    }

    pub fn filtered_sections(&self) -> &[SectionSummary] {
        &self.filtered_sections
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin_select_section(&mut self, number: u32, editions: EditionSet) -> FetchRequest {
        self.begin_content(FetchPurpose::SelectSection, FetchTarget::Section(number), editions)
    }

    pub fn begin_select_grouping(&mut self, number: u32, editions: EditionSet) -> FetchRequest {
        self.begin_content(FetchPurpose::SelectGrouping, FetchTarget::Grouping(number), editions)
    }

    /// Switch between the section and grouping listings and refetch the
    /// listing that is now active.
    pub fn begin_set_view(&mut self, view: ActiveView, editions: EditionSet) -> FetchRequest {
        info!(from = %self.active_view, to = %view, "Switching view");
        self.active_view = view;
        let target = match view {
            ActiveView::Section => FetchTarget::Section(self.current_section),
            ActiveView::Grouping => FetchTarget::Grouping(self.selected_grouping),
        };
        self.begin_content(FetchPurpose::SwitchView, target, editions)
    }

    /// Refetch whatever the active view shows, e.g. after a reciter change.
    pub fn begin_reload(&mut self, editions: EditionSet) -> FetchRequest {
        let (purpose, target) = match self.active_view {
            ActiveView::Section => (
                FetchPurpose::SelectSection,
                FetchTarget::Section(self.current_section),
            ),
            ActiveView::Grouping => (
                FetchPurpose::SelectGrouping,
                FetchTarget::Grouping(self.selected_grouping),
            ),
        };
        self.begin_content(purpose, target, editions)
    }

    pub fn begin_load_section_list(&mut self, editions: EditionSet) -> FetchRequest {
        let request_id = self.next_request_id();
        self.latest_list_request = request_id;
        debug!(request_id, "Requesting section list");
        FetchRequest {
            request_id,
            purpose: FetchPurpose::SectionList,
            target: FetchTarget::SectionList,
            editions,
        }
    }

    /// Apply a finished fetch. Returns true when the verse sequence changed.
    pub fn complete(&mut self, response: FetchResponse) -> bool {
        let latest = match response.target {
            FetchTarget::SectionList => self.latest_list_request,
            FetchTarget::Section(_) | FetchTarget::Grouping(_) => self.latest_content_request,
        };
        if response.request_id != latest {
            if self.discard_stale {
                debug!(
                    request_id = response.request_id,
                    current = latest,
                    "Ignoring stale fetch response"
                );
                return false;
            }
            debug!(
                request_id = response.request_id,
                current = latest,
                "Applying out-of-order fetch response"
            );
        }

        let payload = match response.result {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target = ?response.target, "Fetch failed: {err}");
                self.error = Some(response.purpose.failure_message().to_string());
                if response.purpose != FetchPurpose::SectionList {
                    self.is_loading = false;
                }
                return false;
            }
        };

        match (response.target, payload) {
            (FetchTarget::Section(number), FetchPayload::Section(detail)) => {
                let info = detail.info();
                let mut verses = detail.verses;
                for verse in &mut verses {
                    verse.section = number;
                }
                info!(section = number, verses = verses.len(), "Section ready");
                self.current_section = number;
                self.section_info = Some(info);
                self.current_verses = verses;
                self.is_loading = false;
                true
            }
            (FetchTarget::Grouping(number), FetchPayload::Grouping(verses)) => {
                info!(grouping = number, verses = verses.len(), "Grouping ready");
                self.selected_grouping = number;
                self.current_verses = verses;
                self.is_loading = false;
                true
            }
            (FetchTarget::SectionList, FetchPayload::SectionList(sections)) => {
                info!(count = sections.len(), "Section list ready");
                self.sections = sections;
                self.refilter();
                false
            }
            (target, _) => {
                warn!(?target, "Fetch payload does not match its target");
                self.error = Some(response.purpose.failure_message().to_string());
                self.is_loading = false;
                false
            }
        }
    }

    /// Case-insensitive substring filter over transliterated names and
    /// section numbers. Local only.
    pub fn set_search_filter(&mut self, query: &str) {
        self.search_query = query.to_string();
        self.refilter();
        debug!(
            query,
            matches = self.filtered_sections.len(),
            "Applied section filter"
        );
    }

    pub fn set_current_verse(&mut self, verse: u32) {
        self.current_verse = verse;
    }

    fn refilter(&mut self) {
        let needle = fold(&self.search_query);
        self.filtered_sections = self
            .sections
            .iter()
            .filter(|section| {
                needle.is_empty()
                    || fold(&section.name).contains(&needle)
                    || section.number.to_string().contains(&needle)
            })
            .cloned()
            .collect();
    }

    fn begin_content(
        &mut self,
        purpose: FetchPurpose,
        target: FetchTarget,
        editions: EditionSet,
    ) -> FetchRequest {
        let request_id = self.next_request_id();
        self.latest_content_request = request_id;
        self.is_loading = true;
        self.error = None;
        info!(request_id, ?target, reciter = %editions.recitation, "Loading content");
        FetchRequest {
            request_id,
            purpose,
            target,
            editions,
        }
    }

    fn next_request_id(&mut self) -> u64 {
        self.request_seq = self.request_seq.wrapping_add(1);
        self.request_seq
    }
}

/// Lowercase with diacritics stripped, so "Al-Fātiḥah" matches "fatih".
fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
