//! Narrascene drives narrated explainer animations end to end.
//!
//! - [`voice`] turns a Markdown dialogue script into voice clips and an audio map
//! - [`captions`] pairs each on-screen caption with its clip and stages it on a timeline
//! - [`render`] renders the scenes of a project in parallel through an external engine and
//!   lists the outputs for concatenation
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Caption-to-voice matching and staging.
pub mod captions;
/// Parallel scene rendering.
pub mod render;
/// Script parsing and speech synthesis.
pub mod voice;

pub use crate::foundation::error::{NarrasceneError, NarrasceneResult};
pub use crate::foundation::project::{
    AUDIO_MAP_FILE_NAME, CONCAT_LIST_FILE_NAME, ProjectLayout, Quality, SCRIPT_FILE_NAME,
    SOURCE_FILE_NAME, source_stem,
};

pub use crate::captions::audio_map::{AudioClipRecord, AudioMap};
pub use crate::captions::director::{CaptionDirector, Cue, CueSheet, Stage};
pub use crate::captions::matcher::{
    CaptionMatch, CaptionMatcher, GlobalReuse, MatchCursor, MatchPolicy,
};
pub use crate::captions::similarity::similarity_ratio;
pub use crate::captions::subtitles::{SceneCues, stage_script, write_project_subtitles};
pub use crate::render::batch::{BatchOpts, BatchReport, run_batch};
pub use crate::render::discover::discover_units;
pub use crate::render::engine::{EngineOutcome, ManimEngine, RenderEngine, RenderJob};
pub use crate::render::manifest::RenderManifest;
pub use crate::render::unit::{RenderStatus, RenderUnit, UnitReport};
pub use crate::voice::generate::{GeneratedAudio, generate_audio_map, generate_for_project};
pub use crate::voice::script::{DialogueLine, SceneScript, Script, parse_script};
pub use crate::voice::synth::{SpeakerTable, SpeechSynthesizer, VoicevoxClient, VoicevoxOpts};
