//! Caption-to-voice synchronization.
//!
//! A persisted [`audio_map::AudioMap`] holds the pre-synthesized clips of every scene. During
//! playback a [`matcher::CaptionMatcher`] pairs each caption with at most one clip, and a
//! [`director::CaptionDirector`] stages the result on a [`director::Stage`].

/// Persisted per-scene clip records.
pub mod audio_map;
/// Caption staging on an external timeline.
pub mod director;
/// Clip selection policies and per-scene cursors.
pub mod matcher;
/// Fuzzy text similarity.
pub mod similarity;
/// Script replay into SubRip subtitle files.
pub mod subtitles;
