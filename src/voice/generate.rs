use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    captions::audio_map::{AudioClipRecord, AudioMap},
    foundation::error::{NarrasceneError, NarrasceneResult},
    foundation::project::ProjectLayout,
    voice::script::Script,
    voice::synth::{SpeakerTable, SpeechSynthesizer},
    voice::wav::wav_duration,
};

/// Result of synthesizing a script.
#[derive(Clone, Debug)]
pub struct GeneratedAudio {
    /// The map of every clip that was written and measured.
    pub map: AudioMap,
    /// Dialogue lines that produced no clip.
    pub skipped: usize,
}

/// File name of the clip for dialogue line `position` of `scene`.
pub fn clip_file_name(scene: &str, position: usize) -> String {
    format!("{scene}_{position:03}.wav")
}

/// Synthesize every line of `script` into `audio_dir` and build the matching audio map.
///
/// A line whose synthesis, write or duration read fails is logged and skipped; the recorded clips of a
/// scene keep contiguous indices. File names follow the line's position in the script, so a
/// skipped line leaves a gap in the names but not in the indices.
#[tracing::instrument(skip_all, fields(audio_dir = %audio_dir.display()))]
pub fn generate_audio_map(
    script: &Script,
    synth: &dyn SpeechSynthesizer,
    speakers: &SpeakerTable,
    audio_dir: &Path,
) -> NarrasceneResult<GeneratedAudio> {
    std::fs::create_dir_all(audio_dir)
        .with_context(|| format!("create audio dir '{}'", audio_dir.display()))?;
    let audio_dir = std::path::absolute(audio_dir)
        .with_context(|| format!("resolve audio dir '{}'", audio_dir.display()))?;

    let mut map = AudioMap::new();
    let mut skipped = 0;

    for scene in script.scenes() {
        tracing::info!(scene = %scene.key, lines = scene.lines.len(), "synthesizing scene");
        let mut clips: Vec<AudioClipRecord> = Vec::with_capacity(scene.lines.len());

        for (position, line) in scene.lines.iter().enumerate() {
            let path = audio_dir.join(clip_file_name(&scene.key, position));
            let speaker_id = speakers.id_for(&line.speaker);

            let duration = match synthesize_clip(synth, &line.text, speaker_id, &path) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(scene = %scene.key, position, error = %e, "skipping line");
                    skipped += 1;
                    continue;
                }
            };
            if !(duration.is_finite() && duration > 0.0) {
                tracing::warn!(path = %path.display(), duration, "skipping empty clip");
                skipped += 1;
                continue;
            }

            let sequence_index = u32::try_from(clips.len())
                .map_err(|_| NarrasceneError::validation("too many clips in one scene"))?;
            clips.push(AudioClipRecord {
                scene_key: scene.key.clone(),
                sequence_index,
                speaker: line.speaker.clone(),
                transcript: line.text.clone(),
                file_path: path,
                duration,
            });
        }
        map.insert_scene(scene.key.clone(), clips);
    }

    Ok(GeneratedAudio { map, skipped })
}

fn synthesize_clip(
    synth: &dyn SpeechSynthesizer,
    text: &str,
    speaker_id: u32,
    path: &Path,
) -> NarrasceneResult<f64> {
    let wav = synth.synthesize(text, speaker_id)?;
    std::fs::write(path, wav).with_context(|| format!("write clip '{}'", path.display()))?;
    wav_duration(path)
}

/// Parse the project's script, synthesize it and save `audio_map.json`.
///
/// Returns the generated map and the path it was saved to.
pub fn generate_for_project(
    layout: &ProjectLayout,
    project: &str,
    synth: &dyn SpeechSynthesizer,
    speakers: &SpeakerTable,
) -> NarrasceneResult<(GeneratedAudio, PathBuf)> {
    let script_path = layout.script_file(project);
    if !script_path.is_file() {
        return Err(NarrasceneError::validation(format!(
            "script '{}' not found",
            script_path.display()
        )));
    }
    let script = Script::from_path(&script_path)?;
    tracing::info!(
        script = %script_path.display(),
        scenes = script.scenes().len(),
        lines = script.line_count(),
        "parsed script"
    );

    let generated = generate_audio_map(&script, synth, speakers, &layout.audio_dir(project))?;
    let map_path = layout.audio_map_file(project);
    generated.map.save(&map_path)?;
    tracing::info!(path = %map_path.display(), clips = generated.map.clip_count(), "audio map saved");
    Ok((generated, map_path))
}

#[cfg(test)]
#[path = "../../tests/unit/voice/generate.rs"]
mod tests;
