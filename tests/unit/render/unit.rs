use super::*;
use crate::foundation::error::NarrasceneError;
use crate::render::engine::EngineOutcome;

#[derive(Clone, Copy)]
enum Behavior {
    Produce,
    ExitFailure,
    NoOutput,
    Hang,
    Unavailable,
}

struct ScriptedEngine(Behavior);

impl RenderEngine for ScriptedEngine {
    fn render(&self, job: &RenderJob<'_>) -> NarrasceneResult<EngineOutcome> {
        match self.0 {
            Behavior::Produce => {
                let out = self.expected_output(job);
                std::fs::create_dir_all(out.parent().unwrap()).unwrap();
                std::fs::write(&out, b"mp4").unwrap();
                Ok(EngineOutcome {
                    success: true,
                    exit_code: Some(0),
                    ..EngineOutcome::default()
                })
            }
            Behavior::ExitFailure => Ok(EngineOutcome {
                success: false,
                exit_code: Some(1),
                stderr: "LaTeX Error".to_string(),
                ..EngineOutcome::default()
            }),
            Behavior::NoOutput => Ok(EngineOutcome {
                success: true,
                exit_code: Some(0),
                ..EngineOutcome::default()
            }),
            Behavior::Hang => Ok(EngineOutcome {
                timed_out: true,
                ..EngineOutcome::default()
            }),
            Behavior::Unavailable => Err(NarrasceneError::render("no such program")),
        }
    }
}

fn run(behavior: Behavior) -> (tempfile::TempDir, UnitReport, ProjectLayout) {
    let dir = tempfile::tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let engine = ScriptedEngine(behavior);
    let ctx = RenderContext {
        layout: &layout,
        project: "demo",
        quality: Quality::Medium,
        engine: &engine,
        timeout: None,
    };
    let report = render_unit(&ctx, "Scene01_Intro");
    (dir, report, layout)
}

#[test]
fn success_moves_video_into_canonical_tree() {
    let (_dir, report, layout) = run(Behavior::Produce);
    assert_eq!(report.unit.status, RenderStatus::Success);
    assert_eq!(report.unit.name, "Scene01_Intro");

    let dest = layout.unit_video("demo", "Scene01_Intro", Quality::Medium);
    assert_eq!(report.output.as_deref(), Some(dest.as_path()));
    assert!(dest.is_file());

    let leftover = layout
        .unit_workspace("demo", "Scene01_Intro")
        .join("videos/animation/720p30/Scene01_Intro.mp4");
    assert!(!leftover.exists(), "video is moved, not copied");
}

#[test]
fn failing_exit_surfaces_stderr() {
    let (_dir, report, _) = run(Behavior::ExitFailure);
    assert_eq!(report.unit.status, RenderStatus::Failed);
    assert_eq!(report.stderr.as_deref(), Some("LaTeX Error"));
    assert!(report.output.is_none());
}

#[test]
fn clean_exit_without_video_is_output_missing() {
    let (_dir, report, layout) = run(Behavior::NoOutput);
    assert_eq!(report.unit.status, RenderStatus::OutputMissing);
    assert!(
        !layout
            .unit_video("demo", "Scene01_Intro", Quality::Medium)
            .exists()
    );
}

#[test]
fn deadline_is_reported_as_timed_out() {
    let (_dir, report, _) = run(Behavior::Hang);
    assert_eq!(report.unit.status, RenderStatus::TimedOut);
}

#[test]
fn unavailable_engine_fails_the_unit_only() {
    let (_dir, report, _) = run(Behavior::Unavailable);
    assert_eq!(report.unit.status, RenderStatus::Failed);
    assert!(report.stderr.unwrap().contains("no such program"));
}

#[test]
fn workspace_is_scoped_to_the_unit() {
    let (_dir, _report, layout) = run(Behavior::NoOutput);
    assert!(layout.unit_workspace("demo", "Scene01_Intro").is_dir());
}

#[test]
fn status_labels_distinguish_failure_kinds() {
    assert_eq!(RenderStatus::Failed.to_string(), "FAILED");
    assert_eq!(RenderStatus::OutputMissing.to_string(), "MISSING_FILE");
    assert_eq!(RenderStatus::TimedOut.to_string(), "TIMED_OUT");
    assert_eq!(RenderStatus::default(), RenderStatus::Pending);
}
