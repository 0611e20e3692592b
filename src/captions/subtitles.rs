use std::path::PathBuf;

use anyhow::Context as _;

use crate::{
    captions::audio_map::AudioMap,
    captions::director::{CaptionDirector, CueSheet},
    captions::matcher::MatchPolicy,
    foundation::error::{NarrasceneError, NarrasceneResult},
    foundation::project::ProjectLayout,
    voice::script::Script,
};

/// Staged timeline of one script scene.
#[derive(Clone, Debug)]
pub struct SceneCues {
    /// Script scene key.
    pub scene: String,
    /// Captions that found a clip.
    pub matched: usize,
    /// Recorded timeline.
    pub sheet: CueSheet,
}

/// Replay every scene of `script` through a [`CaptionDirector`] onto its own [`CueSheet`].
///
/// Each scene gets a fresh session, so cursors never leak between scenes.
pub fn stage_script(
    map: &AudioMap,
    script: &Script,
    policy: MatchPolicy,
    fallback_duration: f64,
) -> NarrasceneResult<Vec<SceneCues>> {
    if !(fallback_duration.is_finite() && fallback_duration > 0.0) {
        return Err(NarrasceneError::validation(
            "caption fallback duration must be finite and > 0",
        ));
    }

    let mut out = Vec::with_capacity(script.scenes().len());
    for scene in script.scenes() {
        let mut director = CaptionDirector::for_scene(map, &scene.key, policy)?;
        let mut sheet = CueSheet::new();
        let mut matched = 0;
        for line in &scene.lines {
            let m = director.show_subtitle(&mut sheet, &line.speaker, &line.text, fallback_duration);
            if m.clip.is_some() {
                matched += 1;
            }
        }
        tracing::debug!(scene = %scene.key, matched, lines = scene.lines.len(), "scene staged");
        out.push(SceneCues {
            scene: scene.key.clone(),
            matched,
            sheet,
        });
    }
    Ok(out)
}

/// Stage the project's script against its audio map and write `<scene>.srt` per scene.
///
/// A missing or unreadable audio map degrades to fallback timing. Returns the staged scenes with
/// the file each was written to.
#[tracing::instrument(skip(layout, policy))]
pub fn write_project_subtitles(
    layout: &ProjectLayout,
    project: &str,
    policy: MatchPolicy,
    fallback_duration: f64,
) -> NarrasceneResult<Vec<(SceneCues, PathBuf)>> {
    let script_path = layout.script_file(project);
    if !script_path.is_file() {
        return Err(NarrasceneError::validation(format!(
            "script '{}' not found",
            script_path.display()
        )));
    }
    let script = Script::from_path(&script_path)?;
    let map = AudioMap::load_or_empty(layout.audio_map_file(project));
    let staged = stage_script(&map, &script, policy, fallback_duration)?;

    let dir = layout.subtitles_dir(project);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create subtitles dir '{}'", dir.display()))?;

    let mut written = Vec::with_capacity(staged.len());
    for scene in staged {
        let path = dir.join(format!("{}.srt", scene.scene));
        std::fs::write(&path, scene.sheet.to_srt())
            .with_context(|| format!("write subtitles '{}'", path.display()))?;
        tracing::info!(path = %path.display(), cues = scene.sheet.cues().len(), "subtitles written");
        written.push((scene, path));
    }
    Ok(written)
}

#[cfg(test)]
#[path = "../../tests/unit/captions/subtitles.rs"]
mod tests;
