use std::{collections::HashMap, time::Duration};

use crate::foundation::error::{NarrasceneError, NarrasceneResult};

/// Default VOICEVOX engine address.
pub const DEFAULT_VOICEVOX_URL: &str = "http://127.0.0.1:50021";
/// Default playback speed applied to every synthesized query.
pub const DEFAULT_SPEED_SCALE: f64 = 1.2;
/// Speaker id used for names missing from the table (ずんだもん, normal style).
pub const DEFAULT_SPEAKER_ID: u32 = 3;

/// Turns one line of text into WAV bytes.
pub trait SpeechSynthesizer {
    /// Synthesize `text` in the voice `speaker_id`.
    fn synthesize(&self, text: &str, speaker_id: u32) -> NarrasceneResult<Vec<u8>>;
}

/// Speaker display name to VOICEVOX speaker id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeakerTable {
    ids: HashMap<String, u32>,
    fallback: u32,
}

impl Default for SpeakerTable {
    fn default() -> Self {
        let ids = [
            ("ずんだもん", 3),
            ("めたん", 2),
            ("四国めたん", 2),
            ("つむぎ", 8),
            ("春日部つむぎ", 8),
        ]
        .into_iter()
        .map(|(name, id)| (name.to_string(), id))
        .collect();
        Self {
            ids,
            fallback: DEFAULT_SPEAKER_ID,
        }
    }
}

impl SpeakerTable {
    /// Add or replace a speaker.
    pub fn with_speaker(mut self, name: impl Into<String>, id: u32) -> Self {
        self.ids.insert(name.into(), id);
        self
    }

    /// Id for `name`, or the fallback id for unknown speakers.
    pub fn id_for(&self, name: &str) -> u32 {
        self.ids.get(name).copied().unwrap_or(self.fallback)
    }
}

/// VOICEVOX connection options.
#[derive(Clone, Debug, PartialEq)]
pub struct VoicevoxOpts {
    /// Engine base URL, without trailing slash.
    pub base_url: String,
    /// `speedScale` written into every audio query.
    pub speed_scale: f64,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for VoicevoxOpts {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_VOICEVOX_URL.to_string(),
            speed_scale: DEFAULT_SPEED_SCALE,
            timeout: Duration::from_secs(60),
        }
    }
}

impl VoicevoxOpts {
    /// Reject options that cannot produce a request.
    pub fn validate(&self) -> NarrasceneResult<()> {
        if !(self.speed_scale.is_finite() && self.speed_scale > 0.0) {
            return Err(NarrasceneError::validation(
                "voicevox 'speed_scale' must be finite and > 0",
            ));
        }
        if self.timeout.is_zero() {
            return Err(NarrasceneError::validation("voicevox 'timeout' must be > 0"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(NarrasceneError::validation(format!(
                "voicevox url '{}' must start with http:// or https://",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Blocking client for a local VOICEVOX engine.
///
/// Synthesis is the two-step engine contract: `POST /audio_query` builds a query for the text,
/// the query's `speedScale` is overridden, and `POST /synthesis` renders it to WAV.
#[derive(Clone, Debug)]
pub struct VoicevoxClient {
    http: reqwest::blocking::Client,
    opts: VoicevoxOpts,
}

impl VoicevoxClient {
    /// Build a client; fails on invalid options.
    pub fn new(opts: VoicevoxOpts) -> NarrasceneResult<Self> {
        opts.validate()?;
        let http = reqwest::blocking::Client::builder()
            .timeout(opts.timeout)
            .build()
            .map_err(|e| NarrasceneError::synthesis(format!("build http client: {e}")))?;
        Ok(Self { http, opts })
    }

    /// Options the client was built with.
    pub fn opts(&self) -> &VoicevoxOpts {
        &self.opts
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.opts.base_url.trim_end_matches('/'))
    }

    fn audio_query(&self, text: &str, speaker_id: u32) -> NarrasceneResult<serde_json::Value> {
        let speaker = speaker_id.to_string();
        let resp = self
            .http
            .post(self.endpoint("audio_query"))
            .query(&[("text", text), ("speaker", speaker.as_str())])
            .send()
            .map_err(|e| NarrasceneError::synthesis(format!("audio_query request: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(NarrasceneError::synthesis(format!(
                "audio_query returned HTTP {status}: {body}"
            )));
        }
        resp.json()
            .map_err(|e| NarrasceneError::serde(format!("parse audio_query response: {e}")))
    }
}

impl SpeechSynthesizer for VoicevoxClient {
    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    fn synthesize(&self, text: &str, speaker_id: u32) -> NarrasceneResult<Vec<u8>> {
        let mut query = self.audio_query(text, speaker_id)?;
        set_speed_scale(&mut query, self.opts.speed_scale)?;

        let resp = self
            .http
            .post(self.endpoint("synthesis"))
            .query(&[("speaker", speaker_id.to_string())])
            .json(&query)
            .send()
            .map_err(|e| NarrasceneError::synthesis(format!("synthesis request: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(NarrasceneError::synthesis(format!(
                "synthesis returned HTTP {status}: {body}"
            )));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| NarrasceneError::synthesis(format!("read synthesis body: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Override `speedScale` in an audio query object.
pub fn set_speed_scale(query: &mut serde_json::Value, speed_scale: f64) -> NarrasceneResult<()> {
    let obj = query
        .as_object_mut()
        .ok_or_else(|| NarrasceneError::serde("audio query is not a JSON object"))?;
    obj.insert("speedScale".to_string(), serde_json::Value::from(speed_scale));
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/voice/synth.rs"]
mod tests;
