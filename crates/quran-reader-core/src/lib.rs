pub mod bookmarks;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod model;
pub mod playback;
pub mod preferences;
pub mod session;
pub mod store;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<()> {
    T::export_all_to(out_dir).with_context(|| format!("Failed to export {}", T::name()))
}

/// Regenerate the TypeScript bindings for the snapshot surface in `out_dir`.
pub fn export_ts_bindings(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for entry in
        fs::read_dir(out_dir).with_context(|| format!("Failed to list {}", out_dir.display()))?
    {
        let path = entry.context("Failed to read entry")?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }

    export_single_type::<model::Verse>(out_dir)?;
    export_single_type::<model::SectionSummary>(out_dir)?;
    export_single_type::<model::ActiveView>(out_dir)?;
    export_single_type::<bookmarks::Bookmark>(out_dir)?;
    export_single_type::<preferences::ReadingMode>(out_dir)?;
    export_single_type::<preferences::Settings>(out_dir)?;
    export_single_type::<preferences::SettingsPatch>(out_dir)?;
    export_single_type::<playback::PlaybackStatus>(out_dir)?;
    export_single_type::<session::VerseView>(out_dir)?;
    export_single_type::<session::ReaderPlaybackView>(out_dir)?;
    export_single_type::<session::ReaderSnapshot>(out_dir)?;

    let index_content = r#"export type { Verse } from "./Verse";
export type { SectionSummary } from "./SectionSummary";
export type { ActiveView } from "./ActiveView";
export type { Bookmark } from "./Bookmark";
export type { ReadingMode } from "./ReadingMode";
export type { Settings } from "./Settings";
export type { SettingsPatch } from "./SettingsPatch";
export type { PlaybackStatus } from "./PlaybackStatus";
export type { VerseView } from "./VerseView";
export type { ReaderPlaybackView } from "./ReaderPlaybackView";
export type { ReaderSnapshot } from "./ReaderSnapshot";
"#;

    let index_path = out_dir.join("index.ts");
    fs::write(&index_path, index_content)
        .with_context(|| format!("Failed to write {}", index_path.display()))?;
    Ok(())
}
