use std::path::Path;

use crate::foundation::error::{NarrasceneError, NarrasceneResult};

/// Playback length of a WAV file in seconds (frames / sample rate).
pub fn wav_duration(path: &Path) -> NarrasceneResult<f64> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        NarrasceneError::synthesis(format!("open WAV '{}': {e}", path.display()))
    })?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(NarrasceneError::synthesis(format!(
            "WAV '{}' has a zero sample rate",
            path.display()
        )));
    }
    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

#[cfg(test)]
#[path = "../../tests/unit/voice/wav.rs"]
mod tests;
