use super::*;

fn write_silence(path: &Path, sample_rate: u32, channels: u16, frames: u32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..frames * u32::from(channels) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn duration_is_frames_over_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    write_silence(&path, 24_000, 1, 36_000);
    assert_eq!(wav_duration(&path).unwrap(), 1.5);
}

#[test]
fn stereo_counts_frames_not_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    write_silence(&path, 8_000, 2, 4_000);
    assert_eq!(wav_duration(&path).unwrap(), 0.5);
}

#[test]
fn non_wav_bytes_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.wav");
    std::fs::write(&path, b"not a wav file").unwrap();
    let err = wav_duration(&path).unwrap_err();
    assert!(err.to_string().contains("synthesis error:"));
}
