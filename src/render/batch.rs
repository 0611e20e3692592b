use std::{path::PathBuf, time::Duration};

use rayon::prelude::*;

use crate::{
    foundation::error::{NarrasceneError, NarrasceneResult},
    foundation::project::{ProjectLayout, Quality},
    render::discover::discover_units,
    render::engine::RenderEngine,
    render::manifest::RenderManifest,
    render::unit::{RenderContext, RenderStatus, UnitReport, render_unit},
};

/// Default upper bound on concurrently rendered units.
pub const DEFAULT_MAX_JOBS: usize = 4;

/// Batch configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchOpts {
    /// Upper bound on concurrent units (`>= 1`).
    pub max_jobs: usize,
    /// Per-unit deadline; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for BatchOpts {
    fn default() -> Self {
        Self {
            max_jobs: DEFAULT_MAX_JOBS,
            timeout: None,
        }
    }
}

impl BatchOpts {
    /// Reject option combinations that cannot run.
    pub fn validate(&self) -> NarrasceneResult<()> {
        if self.max_jobs == 0 {
            return Err(NarrasceneError::validation("batch 'max_jobs' must be >= 1"));
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(NarrasceneError::validation(
                "batch 'timeout' must be > 0 when set",
            ));
        }
        Ok(())
    }

    /// Number of worker threads for `units` units on this machine.
    pub fn worker_count(&self, units: usize) -> usize {
        let available = std::thread::available_parallelism().map_or(1, |n| n.get());
        self.max_jobs.min(available).min(units)
    }
}

/// Outcome of a batch: per-unit reports plus the post-batch manifest.
#[derive(Clone, Debug)]
pub struct BatchReport {
    /// One report per requested unit, in request order.
    pub units: Vec<UnitReport>,
    /// Existing canonical outputs in declaration order.
    pub manifest: RenderManifest,
    /// Written concatenation list, `None` when nothing was available to concatenate.
    pub concat_list: Option<PathBuf>,
}

impl BatchReport {
    /// Count of reports with the given status.
    pub fn count(&self, status: RenderStatus) -> usize {
        self.units
            .iter()
            .filter(|r| r.unit.status == status)
            .count()
    }

    /// `true` when every requested unit rendered.
    pub fn all_succeeded(&self) -> bool {
        self.count(RenderStatus::Success) == self.units.len()
    }
}

/// Render `units` (or every discovered unit when `None`) of `project` in parallel.
///
/// Setup problems fail the call before any worker starts: invalid options, a missing source
/// file, or a requested name the source does not declare. Unit failures are reported in
/// [`BatchReport::units`] and never abort the remaining units.
#[tracing::instrument(skip_all, fields(project = project, quality = %quality.resolution_folder()))]
pub fn run_batch(
    layout: &ProjectLayout,
    project: &str,
    units: Option<&[String]>,
    quality: Quality,
    engine: &dyn RenderEngine,
    opts: &BatchOpts,
) -> NarrasceneResult<BatchReport> {
    opts.validate()?;

    let source = layout.source_file(project);
    if !source.is_file() {
        return Err(NarrasceneError::discovery(format!(
            "source file '{}' not found",
            source.display()
        )));
    }

    let declared = discover_units(&source);
    let requested = match units {
        Some(names) => {
            let names = dedup_preserving_order(names);
            check_requested(&names, &declared)?;
            names
        }
        None => declared.clone(),
    };

    let workers = opts.worker_count(requested.len());
    tracing::info!(units = requested.len(), workers, "starting batch");

    let ctx = RenderContext {
        layout,
        project,
        quality,
        engine,
        timeout: opts.timeout,
    };

    let reports = if requested.is_empty() {
        Vec::new()
    } else {
        let pool = build_thread_pool(workers)?;
        pool.install(|| {
            requested
                .par_iter()
                .map(|unit| render_unit(&ctx, unit))
                .collect::<Vec<_>>()
        })
    };

    let manifest = RenderManifest::build(&declared, layout.video_output_dir(project, quality));
    let concat_list = manifest.write_concat_list()?;

    let report = BatchReport {
        units: reports,
        manifest,
        concat_list,
    };
    tracing::info!(
        succeeded = report.count(RenderStatus::Success),
        failed = report.count(RenderStatus::Failed),
        missing = report.count(RenderStatus::OutputMissing),
        timed_out = report.count(RenderStatus::TimedOut),
        "batch finished"
    );
    Ok(report)
}

fn dedup_preserving_order(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

/// Requested names are joined into workspace and output paths.
fn check_requested(requested: &[String], declared: &[String]) -> NarrasceneResult<()> {
    for name in requested {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(NarrasceneError::validation(format!(
                "invalid unit name '{name}'"
            )));
        }
        if !declared.contains(name) {
            return Err(NarrasceneError::validation(format!(
                "unit '{name}' is not declared in the source file"
            )));
        }
    }
    Ok(())
}

fn build_thread_pool(threads: usize) -> NarrasceneResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(NarrasceneError::validation(
            "batch worker count must be >= 1",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("narrascene-render-{i}"))
        .build()
        .map_err(|e| NarrasceneError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/batch.rs"]
mod tests;
