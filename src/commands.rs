//! Line-oriented command parsing for the terminal front end.

use anyhow::{Context, Result, anyhow, bail};
use quran_reader_core::model::ActiveView;
use quran_reader_core::preferences::{ReadingMode, SettingsPatch};
use quran_reader_core::session::SessionCommand;

pub const HELP: &str = "\
commands:
  section N              load section N (1-114)
  juz N                  load grouping N (1-30)
  view section|juz       switch the active listing
  sections               show the (filtered) section list
  search [TEXT]          filter the section list; empty clears
  play [N]               play verse N of the listing, or resume
  pause | resume | toggle
  auto                   toggle continuous playback
  next | prev | stop
  verse N                mark verse N as current
  bookmark S V [NOTE]    toggle a bookmark
  note S V NOTE          replace a bookmark's note
  save-note S V NOTE     set the note, bookmarking the verse if needed
  bookmarks              list bookmarks
  mode script|translation|transliteration
  reciter ID | language L | font NAME | font-size N
  status | json | help | quit";

#[derive(Debug, Clone)]
pub enum Input {
    Session(SessionCommand),
    ShowSections,
    ShowBookmarks,
    ShowStatus,
    ShowJson,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Input>> {
    let line = line.trim();
    let Some((head, rest)) = split_word(line) else {
        return Ok(None);
    };
    let input = match head.to_ascii_lowercase().as_str() {
        "section" | "surah" => Input::Session(SessionCommand::SelectSection {
            number: parse_number(rest, "section")?,
        }),
        "juz" | "grouping" => Input::Session(SessionCommand::SelectGrouping {
            number: parse_number(rest, "juz")?,
        }),
        "view" => Input::Session(SessionCommand::SetView {
            view: parse_view(rest)?,
        }),
        "sections" | "list" => Input::ShowSections,
        "search" => Input::Session(SessionCommand::SetSearchFilter {
            query: rest.to_string(),
        }),
        "play" if rest.is_empty() => Input::Session(SessionCommand::Play { index: None }),
        "play" => {
            let position = parse_number(rest, "verse position")?;
            if position == 0 {
                bail!("verse positions start at 1");
            }
            Input::Session(SessionCommand::Play {
                index: Some(position as usize - 1),
            })
        }
        "resume" => Input::Session(SessionCommand::Play { index: None }),
        "pause" => Input::Session(SessionCommand::Pause),
        "toggle" => Input::Session(SessionCommand::TogglePlayPause),
        "auto" => Input::Session(SessionCommand::ToggleAutoAdvance),
        "next" => Input::Session(SessionCommand::SkipNext),
        "prev" => Input::Session(SessionCommand::SkipPrev),
        "stop" => Input::Session(SessionCommand::Stop),
        "verse" => Input::Session(SessionCommand::SetCurrentVerse {
            verse: parse_number(rest, "verse")?,
        }),
        "bookmark" => {
            let (section, verse, note) = parse_verse_ref(rest)?;
            Input::Session(SessionCommand::ToggleBookmark {
                section,
                verse,
                note: note.to_string(),
            })
        }
        "note" => {
            let (section, verse, note) = parse_verse_ref(rest)?;
            if note.is_empty() {
                bail!("usage: note S V NOTE");
            }
            Input::Session(SessionCommand::UpdateNote {
                section,
                verse,
                note: note.to_string(),
            })
        }
        "save-note" => {
            let (section, verse, note) = parse_verse_ref(rest)?;
            if note.is_empty() {
                bail!("usage: save-note S V NOTE");
            }
            Input::Session(SessionCommand::SaveNote {
                section,
                verse,
                note: note.to_string(),
            })
        }
        "bookmarks" => Input::ShowBookmarks,
        "mode" => Input::Session(SessionCommand::SetReadingMode {
            mode: ReadingMode::parse(rest).ok_or_else(|| anyhow!("unknown reading mode '{rest}'"))?,
        }),
        "reciter" => settings(SettingsPatch {
            reciter_id: Some(required(rest, "reciter")?),
            ..SettingsPatch::default()
        }),
        "language" => settings(SettingsPatch {
            language: Some(required(rest, "language")?),
            ..SettingsPatch::default()
        }),
        "font" => settings(SettingsPatch {
            font: Some(required(rest, "font")?),
            ..SettingsPatch::default()
        }),
        "font-size" => settings(SettingsPatch {
            font_size: Some(parse_number(rest, "font size")?),
            ..SettingsPatch::default()
        }),
        "status" => Input::ShowStatus,
        "json" => Input::ShowJson,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(Some(input))
}

fn settings(patch: SettingsPatch) -> Input {
    Input::Session(SessionCommand::ApplySettings { patch })
}

fn split_word(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    Some(match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (text, ""),
    })
}

fn parse_number(raw: &str, what: &str) -> Result<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("missing {what}");
    }
    raw.parse()
        .with_context(|| format!("invalid {what} '{raw}'"))
}

fn required(raw: &str, what: &str) -> Result<String> {
    if raw.is_empty() {
        bail!("missing {what}");
    }
    Ok(raw.to_string())
}

fn parse_view(raw: &str) -> Result<ActiveView> {
    match raw.to_ascii_lowercase().as_str() {
        "section" | "surah" => Ok(ActiveView::Section),
        "juz" | "grouping" => Ok(ActiveView::Grouping),
        other => bail!("unknown view '{other}'"),
    }
}

fn parse_verse_ref(raw: &str) -> Result<(u32, u32, &str)> {
    let (section, rest) = split_word(raw).ok_or_else(|| anyhow!("missing section"))?;
    let (verse, note) = split_word(rest).ok_or_else(|| anyhow!("missing verse"))?;
    Ok((
        parse_number(section, "section")?,
        parse_number(verse, "verse")?,
        note,
    ))
}
