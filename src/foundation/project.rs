use std::path::{Path, PathBuf};

use crate::foundation::error::{NarrasceneError, NarrasceneResult};

/// File name of the animation source inside a project directory.
pub const SOURCE_FILE_NAME: &str = "animation.py";
/// File name of the Markdown dialogue script inside a project directory.
pub const SCRIPT_FILE_NAME: &str = "script.md";
/// File name of the persisted audio map inside the project's audio directory.
pub const AUDIO_MAP_FILE_NAME: &str = "audio_map.json";
/// File name of the concatenation list written next to the rendered videos.
pub const CONCAT_LIST_FILE_NAME: &str = "concat_list.txt";

/// Render quality preset understood by the render engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Quality {
    /// 854x480 at 15 fps.
    Low,
    /// 1280x720 at 30 fps.
    #[default]
    Medium,
    /// 1920x1080 at 60 fps.
    High,
    /// 2560x1440 at 60 fps.
    Production,
    /// 3840x2160 at 60 fps.
    FourK,
}

impl Quality {
    /// Command-line flag passed to the render engine.
    pub fn engine_flag(self) -> &'static str {
        match self {
            Self::Low => "-ql",
            Self::Medium => "-qm",
            Self::High => "-qh",
            Self::Production => "-qp",
            Self::FourK => "-qk",
        }
    }

    /// Name of the per-resolution folder the engine writes videos into.
    pub fn resolution_folder(self) -> &'static str {
        match self {
            Self::Low => "480p15",
            Self::Medium => "720p30",
            Self::High => "1080p60",
            Self::Production => "1440p60",
            Self::FourK => "2160p60",
        }
    }

    /// Parse an engine flag such as `-qm`.
    pub fn from_engine_flag(flag: &str) -> NarrasceneResult<Self> {
        match flag {
            "-ql" => Ok(Self::Low),
            "-qm" => Ok(Self::Medium),
            "-qh" => Ok(Self::High),
            "-qp" => Ok(Self::Production),
            "-qk" => Ok(Self::FourK),
            other => Err(NarrasceneError::validation(format!(
                "unknown quality flag '{other}'"
            ))),
        }
    }
}

/// Directory conventions for a tree of animation projects.
///
/// ```text
/// <root>/projects/<project>/animation.py
/// <root>/projects/<project>/script.md
/// <root>/projects/<project>/temp_media/<unit>/             isolated engine workspace
/// <root>/projects/<project>/media/videos/<stem>/<res>/    canonical video output
/// <root>/projects/<project>/media/audio/audio_map.json
/// <root>/outputs/<project>.mp4                            final merged video
/// ```
#[derive(Clone, Debug)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all projects.
    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    /// Directory of one project.
    pub fn project_dir(&self, project: &str) -> PathBuf {
        self.projects_dir().join(project)
    }

    /// Animation source file of a project.
    pub fn source_file(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(SOURCE_FILE_NAME)
    }

    /// Dialogue script of a project.
    pub fn script_file(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(SCRIPT_FILE_NAME)
    }

    /// Isolated engine workspace for one render unit.
    pub fn unit_workspace(&self, project: &str, unit: &str) -> PathBuf {
        self.project_dir(project).join("temp_media").join(unit)
    }

    /// Canonical directory that finished videos are moved into.
    pub fn video_output_dir(&self, project: &str, quality: Quality) -> PathBuf {
        self.project_dir(project)
            .join("media")
            .join("videos")
            .join(source_stem(&self.source_file(project)))
            .join(quality.resolution_folder())
    }

    /// Canonical location of one unit's finished video.
    pub fn unit_video(&self, project: &str, unit: &str, quality: Quality) -> PathBuf {
        self.video_output_dir(project, quality)
            .join(format!("{unit}.mp4"))
    }

    /// Directory holding synthesized voice clips.
    pub fn audio_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join("media").join("audio")
    }

    /// Persisted audio map of a project.
    pub fn audio_map_file(&self, project: &str) -> PathBuf {
        self.audio_dir(project).join(AUDIO_MAP_FILE_NAME)
    }

    /// Directory SRT subtitle files are written into.
    pub fn subtitles_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join("media").join("subtitles")
    }

    /// Final merged video of a project.
    pub fn merged_output(&self, project: &str) -> PathBuf {
        self.root.join("outputs").join(format!("{project}.mp4"))
    }
}

/// File stem the engine uses as its per-source video folder.
pub fn source_stem(source_file: &Path) -> String {
    source_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "animation".to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/project.rs"]
mod tests;
