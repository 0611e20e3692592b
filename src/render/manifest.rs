use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::error::{NarrasceneError, NarrasceneResult},
    foundation::project::{CONCAT_LIST_FILE_NAME, ProjectLayout, Quality},
    render::discover::discover_units,
};

/// Units whose video exists in the canonical output tree, in source-declaration order.
///
/// Built once all units have finished and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderManifest {
    output_dir: PathBuf,
    units: Vec<String>,
}

impl RenderManifest {
    /// Keep the entries of `declared` whose `<unit>.mp4` exists in `output_dir`.
    ///
    /// Order follows `declared`, never render completion order.
    pub fn build(declared: &[String], output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let units = declared
            .iter()
            .filter(|unit| output_dir.join(format!("{unit}.mp4")).is_file())
            .cloned()
            .collect();
        Self { output_dir, units }
    }

    /// Build the manifest of a project by re-discovering its declaration order.
    ///
    /// Fails only when the project's source file is missing.
    pub fn for_project(
        layout: &ProjectLayout,
        project: &str,
        quality: Quality,
    ) -> NarrasceneResult<Self> {
        let source = layout.source_file(project);
        if !source.is_file() {
            return Err(NarrasceneError::discovery(format!(
                "source file '{}' not found",
                source.display()
            )));
        }
        let declared = discover_units(&source);
        Ok(Self::build(
            &declared,
            layout.video_output_dir(project, quality),
        ))
    }

    /// Directory holding the listed videos.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Listed unit names, in declaration order.
    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// `true` when there is nothing to concatenate.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Concatenation list in the merge tool's format: one `file '<unit>.mp4'` line per unit.
    pub fn to_concat_list(&self) -> String {
        let mut out = String::new();
        for unit in &self.units {
            out.push_str(&format!("file '{unit}.mp4'\n"));
        }
        out
    }

    /// Write the concatenation list into the output directory.
    ///
    /// Returns `None` (and writes nothing) when the manifest is empty.
    pub fn write_concat_list(&self) -> NarrasceneResult<Option<PathBuf>> {
        if self.is_empty() {
            tracing::info!(dir = %self.output_dir.display(), "nothing to concatenate");
            return Ok(None);
        }
        let path = self.output_dir.join(CONCAT_LIST_FILE_NAME);
        std::fs::write(&path, self.to_concat_list())
            .with_context(|| format!("write concat list '{}'", path.display()))?;
        tracing::info!(path = %path.display(), units = self.units.len(), "concat list written");
        Ok(Some(path))
    }

    /// `ffmpeg` arguments that merge the listed videos into `merged_output`.
    ///
    /// Meant to be run from [`RenderManifest::output_dir`].
    pub fn merge_args(&self, merged_output: &Path) -> Vec<String> {
        [
            "-y",
            "-f",
            "concat",
            "-safe",
            "0",
            "-i",
            CONCAT_LIST_FILE_NAME,
            "-c",
            "copy",
        ]
        .into_iter()
        .map(str::to_string)
        .chain(std::iter::once(merged_output.display().to_string()))
        .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/manifest.rs"]
mod tests;
