//! Voice pre-processing: dialogue script to synthesized clips and an audio map.
//!
//! The generated `audio_map.json` is what [`crate::captions`] matches captions against.

/// Script synthesis into clips plus `audio_map.json`.
pub mod generate;
/// Markdown dialogue script parsing.
pub mod script;
/// Speech synthesis backends.
pub mod synth;
/// WAV probing.
pub mod wav;
