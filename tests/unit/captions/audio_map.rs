use super::*;

const SAMPLE: &str = r#"
{
  "Scene01": [
    { "index": 0, "speaker": "ずんだもん", "text": "hello", "file": "/tmp/a.wav", "duration": 1.0 },
    { "index": 1, "speaker": "めたん", "text": "world", "file": "/tmp/b.wav", "duration": 2.5 }
  ],
  "Scene02": []
}
"#;

#[test]
fn parses_map_and_fills_scene_keys() {
    let map = AudioMap::from_reader(SAMPLE.as_bytes()).unwrap();
    assert_eq!(map.len(), 2);

    let clips = map.clips("Scene01").unwrap();
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[1].scene_key, "Scene01");
    assert_eq!(clips[1].sequence_index, 1);
    assert_eq!(clips[1].speaker, "めたん");
    assert_eq!(clips[1].transcript, "world");
    assert_eq!(clips[1].file_path, PathBuf::from("/tmp/b.wav"));
    assert_eq!(clips[1].duration, 2.5);
    assert!(map.clips("Scene03").is_none());
}

#[test]
fn index_gaps_are_renumbered_by_position() {
    let json = r#"{ "S": [
        { "index": 0, "speaker": "x", "text": "a", "file": "a.wav", "duration": 1.0 },
        { "index": 2, "speaker": "x", "text": "c", "file": "c.wav", "duration": 1.5 }
    ] }"#;
    let map = AudioMap::from_reader(json.as_bytes()).unwrap();
    let clips = map.clips("S").unwrap();
    let indices: Vec<u32> = clips.iter().map(|c| c.sequence_index).collect();
    assert_eq!(indices, [0, 1]);
    assert_eq!(clips[1].transcript, "c");
    map.validate().unwrap();
}

#[test]
fn non_positive_durations_are_dropped() {
    let json = r#"{ "S": [
        { "index": 0, "speaker": "x", "text": "zero", "file": "a.wav", "duration": 0.0 },
        { "index": 1, "speaker": "x", "text": "kept", "file": "b.wav", "duration": 2.0 }
    ] }"#;
    let map = AudioMap::from_reader(json.as_bytes()).unwrap();
    let clips = map.clips("S").unwrap();
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].transcript, "kept");
    assert_eq!(clips[0].sequence_index, 0);
}

#[test]
fn validate_rejects_hand_built_gaps() {
    let mut map = AudioMap::new();
    map.insert_scene(
        "S",
        vec![AudioClipRecord {
            scene_key: String::new(),
            sequence_index: 1,
            speaker: "x".to_string(),
            transcript: "t".to_string(),
            file_path: PathBuf::from("f"),
            duration: 1.0,
        }],
    );
    let err = map.validate().unwrap_err();
    assert!(err.to_string().contains("validation error:"));
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = AudioMap::from_reader("{ not json".as_bytes()).unwrap_err();
    assert!(err.to_string().contains("serialization error:"));
}

#[test]
fn load_or_empty_degrades() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(AudioMap::load_or_empty(&missing).is_empty());

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "[1, 2").unwrap();
    assert!(AudioMap::load_or_empty(&broken).is_empty());
}

#[test]
fn save_then_load_keeps_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("media").join("audio").join("audio_map.json");

    let map = AudioMap::from_reader(SAMPLE.as_bytes()).unwrap();
    map.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("ずんだもん"), "non-ascii text stays readable");
    assert_eq!(AudioMap::from_path(&path).unwrap(), map);
}

#[test]
fn resolves_scene_names_to_keys() {
    let map = AudioMap::from_reader(SAMPLE.as_bytes()).unwrap();
    assert_eq!(map.resolve_scene("Scene01"), Some("Scene01"));
    assert_eq!(map.resolve_scene("Scene01_Intro"), Some("Scene01"));
    assert_eq!(map.resolve_scene("IntroScene02Final"), Some("Scene02"));
    assert_eq!(map.resolve_scene("Outro"), None);
}

#[test]
fn one_damaged_scene_keeps_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audio_map.json");
    std::fs::write(
        &path,
        r#"{
  "Scene01": [
    { "index": 0, "speaker": "ずんだもん", "text": "hello", "file": "a.wav", "duration": 1.0 }
  ],
  "Scene02": [
    { "index": 0, "speaker": "めたん", "text": "one", "file": "b.wav", "duration": 1.0 },
    { "index": 2, "speaker": "めたん", "text": "three", "file": "c.wav", "duration": 2.0 }
  ]
}"#,
    )
    .unwrap();

    let map = AudioMap::load_or_empty(&path);
    assert_eq!(map.clips("Scene01").map(<[_]>::len), Some(1));
    assert_eq!(map.clips("Scene02").map(<[_]>::len), Some(2));
}
