use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Read, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{NarrasceneError, NarrasceneResult};

/// One pre-synthesized voice clip.
///
/// Field names on disk follow the audio-map JSON format: `index`, `speaker`, `text`, `file`,
/// `duration`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioClipRecord {
    /// Scene the clip belongs to. Not stored per record; filled from the map key.
    #[serde(skip)]
    pub scene_key: String,
    /// Position within the scene's dialogue order, contiguous from 0.
    #[serde(rename = "index")]
    pub sequence_index: u32,
    /// Speaker display name.
    pub speaker: String,
    /// Exact text the clip was synthesized from.
    #[serde(rename = "text")]
    pub transcript: String,
    /// Playable audio asset.
    #[serde(rename = "file")]
    pub file_path: PathBuf,
    /// Clip length in seconds.
    pub duration: f64,
}

/// Read-only lookup table from scene key to that scene's ordered clip records.
///
/// Built once per session (usually from `audio_map.json`) and passed to the matcher.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioMap {
    scenes: BTreeMap<String, Vec<AudioClipRecord>>,
}

impl AudioMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the clip list of one scene.
    ///
    /// Every record's `scene_key` is overwritten with `key`.
    pub fn insert_scene(&mut self, key: impl Into<String>, mut clips: Vec<AudioClipRecord>) {
        let key = key.into();
        for clip in &mut clips {
            clip.scene_key.clone_from(&key);
        }
        self.scenes.insert(key, clips);
    }

    /// Parse a map from JSON, repairing each scene on its own.
    ///
    /// Clips with a non-finite or non-positive duration are dropped, and a scene whose indices
    /// are not contiguous from 0 is renumbered by position (maps written after a failed
    /// synthesis keep the script position as `index`). Only unparsable JSON is an error.
    pub fn from_reader(r: impl Read) -> NarrasceneResult<Self> {
        let raw: BTreeMap<String, Vec<AudioClipRecord>> = serde_json::from_reader(r)
            .map_err(|e| NarrasceneError::serde(format!("parse audio map JSON: {e}")))?;

        let mut map = Self::new();
        for (key, clips) in raw {
            let clips = repair_scene(&key, clips);
            map.insert_scene(key, clips);
        }
        Ok(map)
    }

    /// Load a map from a JSON file (see [`AudioMap::from_reader`]).
    pub fn from_path(path: impl AsRef<Path>) -> NarrasceneResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open audio map '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Load a map, degrading to an empty map when the file is absent or unparsable.
    ///
    /// An empty map makes every caption fall back to its default duration.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no audio map; captions use fallback durations");
            return Self::new();
        }
        match Self::from_path(path) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load audio map");
                Self::new()
            }
        }
    }

    /// Write the map as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> NarrasceneResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create audio map dir '{}'", parent.display()))?;
        }
        let f = File::create(path)
            .with_context(|| format!("create audio map '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, &self.scenes)
            .map_err(|e| NarrasceneError::serde(format!("write audio map JSON: {e}")))?;
        w.flush()
            .with_context(|| format!("flush audio map '{}'", path.display()))?;
        Ok(())
    }

    /// Check per-scene invariants: indices contiguous from 0 and positive durations.
    pub fn validate(&self) -> NarrasceneResult<()> {
        for (key, clips) in &self.scenes {
            for (pos, clip) in clips.iter().enumerate() {
                if clip.sequence_index as usize != pos {
                    return Err(NarrasceneError::validation(format!(
                        "scene '{key}': clip at position {pos} has index {}",
                        clip.sequence_index
                    )));
                }
                if !(clip.duration.is_finite() && clip.duration > 0.0) {
                    return Err(NarrasceneError::validation(format!(
                        "scene '{key}': clip {pos} has non-positive duration {}",
                        clip.duration
                    )));
                }
            }
        }
        Ok(())
    }

    /// Clip list of a scene, in dialogue order.
    pub fn clips(&self, scene: &str) -> Option<&[AudioClipRecord]> {
        self.scenes.get(scene).map(Vec::as_slice)
    }

    /// Scene keys in sorted order.
    pub fn scene_keys(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Number of clips across all scenes.
    pub fn clip_count(&self) -> usize {
        self.scenes.values().map(Vec::len).sum()
    }

    /// `true` when the map holds no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Map an animation scene name (e.g. `Scene01_Intro`) to a key of this map.
    ///
    /// Tried in order: the exact name, the part before the first `_`, then the first key
    /// contained in the name.
    pub fn resolve_scene(&self, scene_name: &str) -> Option<&str> {
        if let Some((key, _)) = self.scenes.get_key_value(scene_name) {
            return Some(key);
        }
        if let Some((prefix, _)) = scene_name.split_once('_')
            && let Some((key, _)) = self.scenes.get_key_value(prefix)
        {
            return Some(key);
        }
        self.scene_keys()
            .find(|key| !key.is_empty() && scene_name.contains(key))
    }
}

fn repair_scene(key: &str, mut clips: Vec<AudioClipRecord>) -> Vec<AudioClipRecord> {
    let before = clips.len();
    clips.retain(|c| c.duration.is_finite() && c.duration > 0.0);
    if clips.len() != before {
        tracing::warn!(
            scene = key,
            dropped = before - clips.len(),
            "dropped audio clips with non-positive duration"
        );
    }

    let contiguous = clips
        .iter()
        .enumerate()
        .all(|(pos, c)| c.sequence_index as usize == pos);
    if !contiguous {
        tracing::warn!(scene = key, "audio clip indices not contiguous; renumbering by position");
        clips.sort_by_key(|c| c.sequence_index);
        for (pos, clip) in clips.iter_mut().enumerate() {
            clip.sequence_index = pos as u32;
        }
    }
    clips
}

#[cfg(test)]
#[path = "../../tests/unit/captions/audio_map.rs"]
mod tests;
