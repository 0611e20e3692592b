use super::*;

#[test]
fn known_speakers_map_to_voicevox_ids() {
    let table = SpeakerTable::default();
    assert_eq!(table.id_for("ずんだもん"), 3);
    assert_eq!(table.id_for("めたん"), 2);
    assert_eq!(table.id_for("四国めたん"), 2);
    assert_eq!(table.id_for("つむぎ"), 8);
    assert_eq!(table.id_for("春日部つむぎ"), 8);
}

#[test]
fn unknown_speaker_falls_back() {
    let table = SpeakerTable::default();
    assert_eq!(table.id_for("narrator"), DEFAULT_SPEAKER_ID);
    assert_eq!(table.with_speaker("narrator", 13).id_for("narrator"), 13);
}

#[test]
fn speed_scale_overrides_query_field() {
    let mut query = serde_json::json!({ "speedScale": 1.0, "pitchScale": 0.0 });
    set_speed_scale(&mut query, 1.2).unwrap();
    assert_eq!(query["speedScale"], 1.2);
    assert_eq!(query["pitchScale"], 0.0);

    let mut not_object = serde_json::json!([1, 2]);
    assert!(set_speed_scale(&mut not_object, 1.2).is_err());
}

#[test]
fn default_opts_target_local_engine() {
    let opts = VoicevoxOpts::default();
    assert_eq!(opts.base_url, "http://127.0.0.1:50021");
    assert_eq!(opts.speed_scale, 1.2);
    opts.validate().unwrap();
}

#[test]
fn invalid_opts_are_rejected() {
    let bad_speed = VoicevoxOpts {
        speed_scale: 0.0,
        ..VoicevoxOpts::default()
    };
    assert!(VoicevoxClient::new(bad_speed).is_err());

    let bad_url = VoicevoxOpts {
        base_url: "127.0.0.1:50021".to_string(),
        ..VoicevoxOpts::default()
    };
    assert!(bad_url.validate().is_err());
}

#[test]
fn endpoints_tolerate_trailing_slash() {
    let client = VoicevoxClient::new(VoicevoxOpts {
        base_url: "http://localhost:50021/".to_string(),
        ..VoicevoxOpts::default()
    })
    .unwrap();
    assert_eq!(
        client.endpoint("audio_query"),
        "http://localhost:50021/audio_query"
    );
}

#[test]
fn unreachable_engine_is_a_synthesis_error() {
    // Port 9 (discard) is not a VOICEVOX engine.
    let client = VoicevoxClient::new(VoicevoxOpts {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout: std::time::Duration::from_secs(2),
        ..VoicevoxOpts::default()
    })
    .unwrap();
    let err = client.synthesize("こんにちは", 3).unwrap_err();
    assert!(err.to_string().contains("synthesis error:"));
}
