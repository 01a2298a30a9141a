//! Plain-text views of a `ReaderSnapshot`.

use quran_reader_core::model::ActiveView;
use quran_reader_core::playback::PlaybackStatus;
use quran_reader_core::session::{ReaderSnapshot, VerseView};

pub fn print_listing(snapshot: &ReaderSnapshot) {
    if let Some(error) = &snapshot.error {
        println!("! {error}");
    }
    if snapshot.is_loading {
        println!("loading...");
        return;
    }
    match snapshot.active_view {
        ActiveView::Section => match &snapshot.section_info {
            Some(info) => println!(
                "== {}. {} ({}) - {}, {} verses, {}",
                info.number,
                info.name,
                info.native_name,
                info.name_translation,
                info.verse_count,
                info.revelation_type
            ),
            None => println!("== section {}", snapshot.current_section),
        },
        ActiveView::Grouping => println!(
            "== juz {} ({} verses)",
            snapshot.selected_grouping,
            snapshot.verses.len()
        ),
    }
    for (position, verse) in snapshot.verses.iter().enumerate() {
        for line in verse_lines(position, verse) {
            println!("{line}");
        }
    }
}

fn verse_lines(position: usize, verse: &VerseView) -> Vec<String> {
    let marker = if verse.is_current { '>' } else { ' ' };
    let star = if verse.bookmarked { '*' } else { ' ' };
    let mut lines = vec![format!(
        "{marker}{star}[{}] {}:{}  {}",
        position + 1,
        verse.section,
        verse.number,
        verse.text
    )];
    if let Some(transliteration) = &verse.transliteration {
        lines.push(format!("        {transliteration}"));
    }
    if let Some(translation) = &verse.translation {
        lines.push(format!("        {translation}"));
    }
    if let Some(commentary) = &verse.commentary {
        lines.push(format!("        commentary: {commentary}"));
    }
    if let Some(note) = &verse.note {
        lines.push(format!("        note: {note}"));
    }
    lines
}

pub fn print_sections(snapshot: &ReaderSnapshot) {
    if !snapshot.search_query.is_empty() {
        println!("filter: {}", snapshot.search_query);
    }
    if snapshot.sections.is_empty() {
        println!("(no sections)");
    }
    for section in &snapshot.sections {
        println!(
            "{:>3}. {:<20} {:<22} {:>3} verses",
            section.number, section.name, section.name_translation, section.verse_count
        );
    }
}

pub fn print_bookmarks(snapshot: &ReaderSnapshot) {
    if snapshot.bookmarks.is_empty() {
        println!("(no bookmarks)");
    }
    for bookmark in &snapshot.bookmarks {
        if bookmark.note.is_empty() {
            println!("{}:{}", bookmark.section, bookmark.verse);
        } else {
            println!("{}:{}  {}", bookmark.section, bookmark.verse, bookmark.note);
        }
    }
}

pub fn print_status(snapshot: &ReaderSnapshot) {
    let playback = &snapshot.playback;
    let state = match playback.status {
        PlaybackStatus::Idle => "idle",
        PlaybackStatus::Playing => "playing",
        PlaybackStatus::Paused => "paused",
    };
    let position = playback
        .current_index
        .and_then(|idx| snapshot.verses.get(idx))
        .map(|verse| format!("{}:{}", verse.section, verse.number))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "view={} section={} juz={} verse={} | audio={state} at {position} auto={} {:.0}% | mode={} reciter={} lang={} font={} {}px",
        snapshot.active_view,
        snapshot.current_section,
        snapshot.selected_grouping,
        snapshot.current_verse,
        playback.auto_advance,
        playback.progress_pct,
        snapshot.reading_mode,
        snapshot.settings.reciter_id,
        snapshot.settings.language,
        snapshot.settings.font,
        snapshot.settings.font_size,
    );
    if let Some(error) = &snapshot.playback_error {
        println!("! {error}");
    }
}
