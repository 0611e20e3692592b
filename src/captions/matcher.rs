use std::collections::{BTreeSet, HashMap};

use crate::{
    captions::audio_map::{AudioClipRecord, AudioMap},
    captions::similarity::similarity_ratio,
    foundation::error::{NarrasceneError, NarrasceneResult},
};

/// Lookahead window of the windowed policy.
pub const DEFAULT_WINDOW: usize = 5;
/// Acceptance threshold of the windowed policy.
pub const WINDOWED_THRESHOLD: f64 = 0.2;
/// Acceptance threshold of the global policy.
pub const GLOBAL_THRESHOLD: f64 = 0.6;

/// Whether the global policy may hand the same clip to more than one caption.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GlobalReuse {
    /// A matched clip stays a candidate for later captions.
    #[default]
    AllowRematch,
    /// A matched clip leaves the candidate pool for the rest of the session.
    ConsumeMatched,
}

/// How a caption is paired with a clip from its scene's list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchPolicy {
    /// Fuzzy search over `[cursor, cursor + window)`; accepts when the best ratio exceeds
    /// `threshold` and moves the cursor past the winner.
    Windowed {
        /// Number of candidates examined from the cursor on.
        window: usize,
        /// Ratio that the best candidate must strictly exceed.
        threshold: f64,
    },
    /// Takes the record at the cursor unconditionally; the list is trusted to be in script order.
    Sequential,
    /// Fuzzy search over the whole list; the cursor does not move.
    Global {
        /// Ratio that the best candidate must strictly exceed.
        threshold: f64,
        /// Re-match behavior for already matched clips.
        reuse: GlobalReuse,
    },
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::windowed()
    }
}

impl MatchPolicy {
    /// Windowed policy with the default window and threshold.
    pub fn windowed() -> Self {
        Self::Windowed {
            window: DEFAULT_WINDOW,
            threshold: WINDOWED_THRESHOLD,
        }
    }

    /// Global policy with the default threshold.
    pub fn global(reuse: GlobalReuse) -> Self {
        Self::Global {
            threshold: GLOBAL_THRESHOLD,
            reuse,
        }
    }

    /// Reject zero-sized windows and thresholds outside `[0, 1)`.
    pub fn validate(&self) -> NarrasceneResult<()> {
        let threshold = match *self {
            Self::Windowed { window, threshold } => {
                if window == 0 {
                    return Err(NarrasceneError::validation(
                        "match window must be >= 1",
                    ));
                }
                threshold
            }
            Self::Sequential => return Ok(()),
            Self::Global { threshold, .. } => threshold,
        };
        if !(0.0..1.0).contains(&threshold) {
            return Err(NarrasceneError::validation(format!(
                "match threshold must be in [0, 1), got {threshold}"
            )));
        }
        Ok(())
    }
}

/// Position in a scene's clip list from which the next search starts.
///
/// Only ever moves forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchCursor {
    next_search_index: usize,
}

impl MatchCursor {
    /// Index the next search starts from.
    pub fn next_search_index(self) -> usize {
        self.next_search_index
    }

    fn advance_to(&mut self, next: usize) {
        self.next_search_index = self.next_search_index.max(next);
    }
}

/// Outcome of matching one caption: the clip to play, if any, and how long to hold the caption.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionMatch<'a> {
    /// Clip to play alongside the caption.
    pub clip: Option<&'a AudioClipRecord>,
    /// Seconds the caption stays visible.
    pub duration: f64,
}

impl CaptionMatch<'_> {
    fn fallback(duration: f64) -> Self {
        Self {
            clip: None,
            duration,
        }
    }
}

#[derive(Debug, Default)]
struct SceneState {
    cursor: MatchCursor,
    consumed: BTreeSet<usize>,
}

/// Pairs captions with pre-synthesized clips for one playback session.
///
/// Each scene gets its own cursor on first use; [`CaptionMatcher::end_scene`] discards it.
/// A matcher is single-session state and is not meant to be shared across threads.
#[derive(Debug)]
pub struct CaptionMatcher<'a> {
    map: &'a AudioMap,
    policy: MatchPolicy,
    scenes: HashMap<String, SceneState>,
}

impl<'a> CaptionMatcher<'a> {
    /// Create a matcher over `map` using `policy`.
    pub fn new(map: &'a AudioMap, policy: MatchPolicy) -> NarrasceneResult<Self> {
        policy.validate()?;
        Ok(Self {
            map,
            policy,
            scenes: HashMap::new(),
        })
    }

    /// Policy this matcher was built with.
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Current cursor of a scene (zero if the scene has not been touched).
    pub fn cursor(&self, scene: &str) -> MatchCursor {
        self.scenes
            .get(scene)
            .map(|s| s.cursor)
            .unwrap_or_default()
    }

    /// Drop the per-scene state once the scene has finished playing.
    pub fn end_scene(&mut self, scene: &str) {
        self.scenes.remove(scene);
    }

    /// Pick the clip for `text` in `scene` and advance that scene's cursor.
    ///
    /// Never fails: a missing scene, no acceptable candidate or a missing audio file all yield
    /// `fallback_duration` without a clip. A consumed position stays consumed even when its
    /// file turns out to be missing.
    pub fn match_and_advance(
        &mut self,
        scene: &str,
        speaker: &str,
        text: &str,
        fallback_duration: f64,
    ) -> CaptionMatch<'a> {
        let map = self.map;
        let Some(clips) = map.clips(scene) else {
            tracing::debug!(scene, "no clips for scene");
            return CaptionMatch::fallback(fallback_duration);
        };

        let policy = self.policy;
        let state = self.scenes.entry(scene.to_string()).or_default();
        let accepted = match policy {
            MatchPolicy::Windowed { window, threshold } => {
                select_windowed(clips, &mut state.cursor, text, window, threshold)
            }
            MatchPolicy::Sequential => select_sequential(clips, &mut state.cursor),
            MatchPolicy::Global { threshold, reuse } => {
                select_global(clips, &mut state.consumed, text, threshold, reuse)
            }
        };

        let Some(idx) = accepted else {
            tracing::debug!(scene, speaker, "no clip accepted");
            return CaptionMatch::fallback(fallback_duration);
        };

        let clip = &clips[idx];
        if !clip.file_path.exists() {
            tracing::warn!(
                scene,
                index = clip.sequence_index,
                file = %clip.file_path.display(),
                "matched clip is missing on disk"
            );
            return CaptionMatch::fallback(fallback_duration);
        }

        tracing::debug!(scene, speaker, index = clip.sequence_index, "clip matched");
        CaptionMatch {
            clip: Some(clip),
            duration: clip.duration,
        }
    }
}

/// Highest-ratio candidate; the first one wins ties and a zero ratio never wins.
fn best_candidate<'t>(
    text: &str,
    candidates: impl Iterator<Item = (usize, &'t str)>,
) -> Option<(usize, f64)> {
    let mut best = None;
    let mut highest = 0.0;
    for (idx, transcript) in candidates {
        let ratio = similarity_ratio(text, transcript);
        if ratio > highest {
            highest = ratio;
            best = Some(idx);
        }
    }
    best.map(|idx| (idx, highest))
}

fn select_windowed(
    clips: &[AudioClipRecord],
    cursor: &mut MatchCursor,
    text: &str,
    window: usize,
    threshold: f64,
) -> Option<usize> {
    let start = cursor.next_search_index;
    let end = start.saturating_add(window).min(clips.len());
    if start >= end {
        return None;
    }

    let candidates = clips[start..end]
        .iter()
        .enumerate()
        .map(|(offset, c)| (offset, c.transcript.as_str()));
    let (offset, ratio) = best_candidate(text, candidates)?;
    if ratio <= threshold {
        return None;
    }

    cursor.advance_to(start + offset + 1);
    Some(start + offset)
}

fn select_sequential(clips: &[AudioClipRecord], cursor: &mut MatchCursor) -> Option<usize> {
    let start = cursor.next_search_index;
    if start >= clips.len() {
        return None;
    }
    cursor.advance_to(start + 1);
    Some(start)
}

fn select_global(
    clips: &[AudioClipRecord],
    consumed: &mut BTreeSet<usize>,
    text: &str,
    threshold: f64,
    reuse: GlobalReuse,
) -> Option<usize> {
    let candidates = clips
        .iter()
        .enumerate()
        .filter(|(idx, _)| reuse == GlobalReuse::AllowRematch || !consumed.contains(idx))
        .map(|(idx, c)| (idx, c.transcript.as_str()));
    let (idx, ratio) = best_candidate(text, candidates)?;
    if ratio <= threshold {
        return None;
    }

    if reuse == GlobalReuse::ConsumeMatched {
        consumed.insert(idx);
    }
    Some(idx)
}

#[cfg(test)]
#[path = "../../tests/unit/captions/matcher.rs"]
mod tests;
