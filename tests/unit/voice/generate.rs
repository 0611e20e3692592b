use std::{cell::RefCell, io::Cursor};

use super::*;
use crate::voice::script::parse_script;

const RATE: u32 = 8_000;

/// Writes 0.25 s of silence per character; refuses text containing `FAIL`.
#[derive(Default)]
struct SilentSynth {
    calls: RefCell<Vec<(String, u32)>>,
}

impl SpeechSynthesizer for SilentSynth {
    fn synthesize(&self, text: &str, speaker_id: u32) -> NarrasceneResult<Vec<u8>> {
        self.calls.borrow_mut().push((text.to_string(), speaker_id));
        if text.contains("FAIL") {
            return Err(NarrasceneError::synthesis("engine refused"));
        }
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut buf, spec).unwrap();
            for _ in 0..text.chars().count() as u32 * RATE / 4 {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        Ok(buf.into_inner())
    }
}

#[test]
fn writes_clips_and_records_durations() {
    let dir = tempfile::tempdir().unwrap();
    let script = parse_script("## Scene 01\n- **ずんだもん**: abcd\n- **めたん**: ab\n");
    let synth = SilentSynth::default();

    let out = generate_audio_map(&script, &synth, &SpeakerTable::default(), dir.path()).unwrap();
    assert_eq!(out.skipped, 0);

    let clips = out.map.clips("Scene01").unwrap();
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[0].sequence_index, 0);
    assert_eq!(clips[0].duration, 1.0);
    assert_eq!(clips[1].duration, 0.5);
    assert_eq!(clips[1].speaker, "めたん");
    assert_eq!(clips[1].scene_key, "Scene01");
    assert!(clips[0].file_path.is_absolute());
    assert!(clips[0].file_path.ends_with("Scene01_000.wav"));
    assert!(clips[1].file_path.is_file());

    let calls = synth.calls.borrow();
    assert_eq!(calls[0], ("abcd".to_string(), 3));
    assert_eq!(calls[1], ("ab".to_string(), 2));
}

#[test]
fn failed_lines_are_skipped_with_contiguous_indices() {
    let dir = tempfile::tempdir().unwrap();
    let script = parse_script("## Scene 02\n- **A**: one\n- **A**: FAIL\n- **A**: three\n");

    let out = generate_audio_map(
        &script,
        &SilentSynth::default(),
        &SpeakerTable::default(),
        dir.path(),
    )
    .unwrap();
    assert_eq!(out.skipped, 1);

    let clips = out.map.clips("Scene02").unwrap();
    let indices: Vec<u32> = clips.iter().map(|c| c.sequence_index).collect();
    assert_eq!(indices, [0, 1]);
    assert_eq!(clips[1].transcript, "three");
    assert!(clips[1].file_path.ends_with("Scene02_002.wav"));
    out.map.validate().unwrap();
}

#[test]
fn silent_clip_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let script = parse_script("## Scene 03\n- **A**: （笑）\n");
    let out = generate_audio_map(
        &script,
        &SilentSynth::default(),
        &SpeakerTable::default(),
        dir.path(),
    )
    .unwrap();
    assert_eq!(out.skipped, 1);
    assert_eq!(out.map.clips("Scene03").unwrap().len(), 0);
}

#[test]
fn project_generation_saves_a_loadable_map() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    std::fs::create_dir_all(layout.project_dir("demo")).unwrap();
    std::fs::write(
        layout.script_file("demo"),
        "### Scene 01: Intro\n- **ずんだもん**: hello\n",
    )
    .unwrap();

    let (out, path) = generate_for_project(
        &layout,
        "demo",
        &SilentSynth::default(),
        &SpeakerTable::default(),
    )
    .unwrap();
    assert_eq!(path, layout.audio_map_file("demo"));

    let loaded = AudioMap::from_path(&path).unwrap();
    assert_eq!(loaded, out.map);
    assert_eq!(loaded.clip_count(), 1);
}

#[test]
fn project_without_script_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let err = generate_for_project(
        &layout,
        "demo",
        &SilentSynth::default(),
        &SpeakerTable::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("script"));
}

#[test]
fn clip_names_are_zero_padded() {
    assert_eq!(clip_file_name("Scene01", 7), "Scene01_007.wav");
    assert_eq!(clip_file_name("General", 1234), "General_1234.wav");
}
