use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use crate::{
    captions::audio_map::AudioMap,
    captions::matcher::{CaptionMatch, CaptionMatcher, MatchPolicy},
    foundation::error::NarrasceneResult,
};

/// Seconds the caption fade-in (and fade-out of the previous one) takes.
pub const CAPTION_TRANSITION_SECS: f64 = 0.4;
/// Extra hold after the clip (or fallback) duration before the next caption.
pub const CAPTION_TAIL_SECS: f64 = 0.2;
/// Hold used for a caption without a matching clip when the caller has no better estimate.
pub const DEFAULT_FALLBACK_SECS: f64 = 3.0;

/// Timeline engine that captions are staged on.
///
/// Calls arrive in playback order: an optional `add_sound`, then `show_caption`, then `wait`.
pub trait Stage {
    /// Start playing an audio file at the current timeline position.
    fn add_sound(&mut self, path: &Path);
    /// Replace the visible caption, animating over `transition_secs`.
    fn show_caption(&mut self, speaker: &str, text: &str, transition_secs: f64);
    /// Advance the timeline by `secs`.
    fn wait(&mut self, secs: f64);
}

/// Stages the captions of one scene, pairing each with its voice clip.
#[derive(Debug)]
pub struct CaptionDirector<'a> {
    matcher: CaptionMatcher<'a>,
    scene_key: String,
}

impl<'a> CaptionDirector<'a> {
    /// Start a caption session for the animation scene `scene_name`.
    ///
    /// The scene name is resolved to an audio-map key with [`AudioMap::resolve_scene`]; an
    /// unresolved name simply never matches.
    pub fn for_scene(
        map: &'a AudioMap,
        scene_name: &str,
        policy: MatchPolicy,
    ) -> NarrasceneResult<Self> {
        let scene_key = map
            .resolve_scene(scene_name)
            .unwrap_or(scene_name)
            .to_string();
        Ok(Self {
            matcher: CaptionMatcher::new(map, policy)?,
            scene_key,
        })
    }

    /// Audio-map key this session reads from.
    pub fn scene_key(&self) -> &str {
        &self.scene_key
    }

    /// Show one caption: play its clip if one matches, then hold for the clip's duration (or
    /// `fallback_duration`) plus [`CAPTION_TAIL_SECS`].
    pub fn show_subtitle(
        &mut self,
        stage: &mut dyn Stage,
        speaker: &str,
        text: &str,
        fallback_duration: f64,
    ) -> CaptionMatch<'a> {
        let m = self
            .matcher
            .match_and_advance(&self.scene_key, speaker, text, fallback_duration);
        if let Some(clip) = m.clip {
            stage.add_sound(&clip.file_path);
        }
        stage.show_caption(speaker, text, CAPTION_TRANSITION_SECS);
        stage.wait(m.duration + CAPTION_TAIL_SECS);
        m
    }
}

/// One timed caption on a [`CueSheet`].
#[derive(Clone, Debug, PartialEq)]
pub struct Cue {
    /// Seconds from scene start when the caption appears.
    pub start: f64,
    /// Seconds from scene start when the caption is replaced (or the scene ends).
    pub end: f64,
    /// Speaker label.
    pub speaker: String,
    /// Caption text.
    pub text: String,
    /// Clip started together with the caption.
    pub audio: Option<PathBuf>,
}

/// [`Stage`] that records captions on a timeline instead of drawing them.
#[derive(Clone, Debug, Default)]
pub struct CueSheet {
    now: f64,
    pending_sound: Option<PathBuf>,
    cues: Vec<Cue>,
}

impl CueSheet {
    /// Create an empty sheet at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current timeline position in seconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Recorded cues in timeline order.
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Render the cues as SubRip text, speaker on the first line of each entry.
    pub fn to_srt(&self) -> String {
        let mut out = String::new();
        for (i, cue) in self.cues.iter().enumerate() {
            let _ = writeln!(out, "{}", i + 1);
            let _ = writeln!(
                out,
                "{} --> {}",
                format_srt_time(cue.start),
                format_srt_time(cue.end)
            );
            if !cue.speaker.is_empty() {
                let _ = writeln!(out, "{}", cue.speaker);
            }
            let _ = writeln!(out, "{}", cue.text);
            out.push('\n');
        }
        out
    }
}

impl Stage for CueSheet {
    fn add_sound(&mut self, path: &Path) {
        self.pending_sound = Some(path.to_path_buf());
    }

    fn show_caption(&mut self, speaker: &str, text: &str, transition_secs: f64) {
        self.cues.push(Cue {
            start: self.now,
            end: self.now,
            speaker: speaker.to_string(),
            text: text.to_string(),
            audio: self.pending_sound.take(),
        });
        self.wait(transition_secs);
    }

    fn wait(&mut self, secs: f64) {
        self.now += secs.max(0.0);
        if let Some(open) = self.cues.last_mut() {
            open.end = self.now;
        }
    }
}

fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

#[cfg(test)]
#[path = "../../tests/unit/captions/director.rs"]
mod tests;
