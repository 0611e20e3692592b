use std::{
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context as _;

use crate::{
    foundation::error::NarrasceneResult,
    foundation::project::{ProjectLayout, Quality},
    render::engine::{RenderEngine, RenderJob},
};

/// Terminal (or not yet terminal) state of a render unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderStatus {
    /// Not rendered yet.
    #[default]
    Pending,
    /// Rendered and moved into the canonical output tree.
    Success,
    /// The engine exited with an error (or could not be run).
    Failed,
    /// The engine exited successfully but the expected video was not produced.
    OutputMissing,
    /// The engine was killed at its deadline.
    TimedOut,
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::OutputMissing => "MISSING_FILE",
            Self::TimedOut => "TIMED_OUT",
        })
    }
}

/// A named, independently renderable scene of a source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderUnit {
    /// Scene name, unique within its source file.
    pub name: String,
    /// Source file declaring the scene.
    pub source_file: PathBuf,
    /// Current status.
    pub status: RenderStatus,
}

impl RenderUnit {
    /// A unit that has not been rendered yet.
    pub fn pending(name: impl Into<String>, source_file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_file: source_file.into(),
            status: RenderStatus::Pending,
        }
    }
}

/// Result of rendering one unit.
#[derive(Clone, Debug)]
pub struct UnitReport {
    /// The unit with its terminal status.
    pub unit: RenderUnit,
    /// Wall-clock time spent on the unit.
    pub elapsed: Duration,
    /// Canonical video location on success.
    pub output: Option<PathBuf>,
    /// Engine stderr (or the reason the engine could not run) on failure.
    pub stderr: Option<String>,
}

/// Shared inputs of every unit render in a batch.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Project directory conventions.
    pub layout: &'a ProjectLayout,
    /// Project name under the layout's projects directory.
    pub project: &'a str,
    /// Quality preset.
    pub quality: Quality,
    /// Engine used for every unit.
    pub engine: &'a dyn RenderEngine,
    /// Per-unit deadline.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("project", &self.project)
            .field("quality", &self.quality)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Render one unit in its own workspace and move the result into the canonical output tree.
///
/// Never fails: every problem ends up in the returned report's status. Nothing is retried.
#[tracing::instrument(skip(ctx), fields(project = ctx.project))]
pub fn render_unit(ctx: &RenderContext<'_>, unit: &str) -> UnitReport {
    let source_file = ctx.layout.source_file(ctx.project);
    let workspace = ctx.layout.unit_workspace(ctx.project, unit);
    let started = Instant::now();
    tracing::info!("starting");

    let finish = |status: RenderStatus, output: Option<PathBuf>, stderr: Option<String>| {
        let elapsed = started.elapsed();
        tracing::info!(%status, elapsed_secs = elapsed.as_secs_f64(), "finished");
        UnitReport {
            unit: RenderUnit {
                name: unit.to_string(),
                source_file: source_file.clone(),
                status,
            },
            elapsed,
            output,
            stderr,
        }
    };

    if let Err(e) = std::fs::create_dir_all(&workspace) {
        let msg = format!("create workspace '{}': {e}", workspace.display());
        tracing::warn!("{msg}");
        return finish(RenderStatus::Failed, None, Some(msg));
    }

    let job = RenderJob {
        source_file: &source_file,
        unit,
        quality: ctx.quality,
        workspace: &workspace,
        timeout: ctx.timeout,
    };

    let outcome = match ctx.engine.render(&job) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(error = %e, "engine could not run");
            return finish(RenderStatus::Failed, None, Some(e.to_string()));
        }
    };

    if outcome.timed_out {
        tracing::warn!(timeout = ?ctx.timeout, "render timed out");
        return finish(RenderStatus::TimedOut, None, Some(outcome.stderr));
    }
    if !outcome.success {
        tracing::warn!(exit_code = ?outcome.exit_code, stderr = %outcome.stderr.trim(), "render failed");
        return finish(RenderStatus::Failed, None, Some(outcome.stderr));
    }

    let produced = ctx.engine.expected_output(&job);
    if !produced.is_file() {
        tracing::warn!(expected = %produced.display(), "video file not found");
        return finish(RenderStatus::OutputMissing, None, None);
    }

    let dest = ctx.layout.unit_video(ctx.project, unit, ctx.quality);
    match move_file(&produced, &dest) {
        Ok(()) => finish(RenderStatus::Success, Some(dest), None),
        Err(e) => {
            tracing::warn!(error = %e, "failed to move rendered video");
            finish(RenderStatus::Failed, None, Some(e.to_string()))
        }
    }
}

/// Move `from` to `to`, creating `to`'s parent; falls back to copy + remove across devices.
fn move_file(from: &Path, to: &Path) -> NarrasceneResult<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)
        .with_context(|| format!("copy '{}' to '{}'", from.display(), to.display()))?;
    std::fs::remove_file(from).with_context(|| format!("remove '{}'", from.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/unit.rs"]
mod tests;
