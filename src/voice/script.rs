use std::{path::Path, sync::LazyLock};

use anyhow::Context as _;
use regex::Regex;

use crate::foundation::error::NarrasceneResult;

/// Scene key used for dialogue that appears before any scene header.
pub const DEFAULT_SCENE: &str = "General";

static SCENE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#+\s*(Scene\s*\w+).*$").expect("scene header pattern is valid")
});

static DIALOGUE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*-\s*\*\*(.*?)\*\*\s*[:：]\s*(.*)$").expect("dialogue pattern is valid")
});

static ASIDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"（.*?）|\(.*?\)").expect("aside pattern is valid"));

/// One spoken line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogueLine {
    /// Speaker display name, as written between `**`.
    pub speaker: String,
    /// Text to speak, with parenthetical asides removed.
    pub text: String,
}

/// Ordered dialogue of one scene.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneScript {
    /// Normalized key (`Scene 01` becomes `Scene01`).
    pub key: String,
    /// Dialogue in script order.
    pub lines: Vec<DialogueLine>,
}

/// A parsed dialogue script: scenes in order of first appearance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    scenes: Vec<SceneScript>,
}

impl Script {
    /// Read and parse a Markdown script file.
    pub fn from_path(path: impl AsRef<Path>) -> NarrasceneResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read script '{}'", path.display()))?;
        Ok(parse_script(&text))
    }

    /// Scenes in order of first appearance.
    pub fn scenes(&self) -> &[SceneScript] {
        &self.scenes
    }

    /// Dialogue of the scene with key `key`.
    pub fn scene(&self, key: &str) -> Option<&SceneScript> {
        self.scenes.iter().find(|s| s.key == key)
    }

    /// Total number of dialogue lines.
    pub fn line_count(&self) -> usize {
        self.scenes.iter().map(|s| s.lines.len()).sum()
    }

    fn scene_mut(&mut self, key: &str) -> &mut SceneScript {
        let pos = match self.scenes.iter().position(|s| s.key == key) {
            Some(pos) => pos,
            None => {
                self.scenes.push(SceneScript {
                    key: key.to_string(),
                    lines: Vec::new(),
                });
                self.scenes.len() - 1
            }
        };
        &mut self.scenes[pos]
    }
}

/// Parse a Markdown dialogue script.
///
/// ```text
/// ### Scene 01: Intro
/// - **ずんだもん**: こんにちは（笑）
/// ```
///
/// A repeated scene header starts that scene's dialogue over while keeping its first
/// position. Lines matching neither pattern are ignored.
pub fn parse_script(text: &str) -> Script {
    let mut script = Script::default();
    let mut current = DEFAULT_SCENE.to_string();

    for line in text.lines() {
        if let Some(caps) = SCENE_HEADER.captures(line) {
            current = caps[1].replace(' ', "");
            script.scene_mut(&current).lines.clear();
            continue;
        }
        if let Some(caps) = DIALOGUE_LINE.captures(line) {
            let text = ASIDE.replace_all(&caps[2], "");
            script.scene_mut(&current).lines.push(DialogueLine {
                speaker: caps[1].to_string(),
                text: text.trim().to_string(),
            });
        }
    }
    script
}

#[cfg(test)]
#[path = "../../tests/unit/voice/script.rs"]
mod tests;
