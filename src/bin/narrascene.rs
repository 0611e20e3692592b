use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use narrascene::{
    BatchOpts, GlobalReuse, ManimEngine, MatchPolicy, ProjectLayout, Quality, RenderManifest,
    RenderStatus, SpeakerTable, VoicevoxClient, VoicevoxOpts,
};

#[derive(Parser, Debug)]
#[command(name = "narrascene", version)]
struct Cli {
    /// Root directory holding `projects/` and `outputs/`.
    #[arg(long, global = true, env = "NARRASCENE_ROOT", default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the scenes of a project in parallel and write the concatenation list.
    Render(RenderArgs),
    /// Rebuild the concatenation list from existing videos.
    Concat(ConcatArgs),
    /// Synthesize the project's script into voice clips and an audio map.
    Voice(VoiceArgs),
    /// Write SubRip subtitles for each script scene using the audio map timings.
    Subtitles(SubtitlesArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Project name under `projects/`.
    project: String,

    /// Render quality.
    #[arg(short, long, value_enum, default_value_t = QualityChoice::Medium)]
    quality: QualityChoice,

    /// Render only these scenes (default: every scene in the source file).
    #[arg(short, long, num_args = 1..)]
    scenes: Vec<String>,

    /// Maximum number of concurrent renders.
    #[arg(short, long, default_value_t = narrascene::render::batch::DEFAULT_MAX_JOBS)]
    jobs: usize,

    /// Per-scene deadline in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Render engine program.
    #[arg(long, default_value = "manim")]
    engine: PathBuf,

    /// Extra directory appended to the engine's PATH (repeatable).
    #[arg(long = "extra-path")]
    extra_path: Vec<PathBuf>,

    /// Exit non-zero when any scene fails.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Parser, Debug)]
struct ConcatArgs {
    /// Project name under `projects/`.
    project: String,

    /// Quality whose videos are listed.
    #[arg(short, long, value_enum, default_value_t = QualityChoice::Medium)]
    quality: QualityChoice,
}

#[derive(Parser, Debug)]
struct VoiceArgs {
    /// Project name under `projects/`.
    project: String,

    /// VOICEVOX engine URL.
    #[arg(long, env = "VOICEVOX_URL", default_value = narrascene::voice::synth::DEFAULT_VOICEVOX_URL)]
    voicevox_url: String,

    /// Speech speed scale.
    #[arg(long, default_value_t = narrascene::voice::synth::DEFAULT_SPEED_SCALE)]
    speed: f64,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    request_timeout: u64,
}

#[derive(Parser, Debug)]
struct SubtitlesArgs {
    /// Project name under `projects/`.
    project: String,

    /// Caption matching policy.
    #[arg(long, value_enum, default_value_t = PolicyChoice::Windowed)]
    policy: PolicyChoice,

    /// Seconds a caption without a clip stays on screen.
    #[arg(long, default_value_t = narrascene::captions::director::DEFAULT_FALLBACK_SECS)]
    fallback: f64,

    /// With the global policy, never hand the same clip to two captions.
    #[arg(long, default_value_t = false)]
    consume_global: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QualityChoice {
    Low,
    Medium,
    High,
    Production,
    Fourk,
}

impl From<QualityChoice> for Quality {
    fn from(q: QualityChoice) -> Self {
        match q {
            QualityChoice::Low => Quality::Low,
            QualityChoice::Medium => Quality::Medium,
            QualityChoice::High => Quality::High,
            QualityChoice::Production => Quality::Production,
            QualityChoice::Fourk => Quality::FourK,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    Windowed,
    Sequential,
    Global,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let layout = ProjectLayout::new(&cli.root);
    match cli.cmd {
        Command::Render(args) => cmd_render(&layout, args),
        Command::Concat(args) => cmd_concat(&layout, args),
        Command::Voice(args) => cmd_voice(&layout, args),
        Command::Subtitles(args) => cmd_subtitles(&layout, args),
    }
}

fn cmd_render(layout: &ProjectLayout, args: RenderArgs) -> anyhow::Result<()> {
    let quality = Quality::from(args.quality);
    let opts = BatchOpts {
        max_jobs: args.jobs,
        timeout: args.timeout.map(Duration::from_secs),
    };
    let engine = args
        .extra_path
        .into_iter()
        .fold(ManimEngine::new(args.engine), |e, dir| e.with_extra_path(dir));
    let units = (!args.scenes.is_empty()).then_some(args.scenes.as_slice());

    let report = narrascene::run_batch(layout, &args.project, units, quality, &engine, &opts)
        .with_context(|| format!("render project '{}'", args.project))?;

    eprintln!("{:<32} {:<12} {:>9}", "SCENE", "STATUS", "SECONDS");
    for r in &report.units {
        eprintln!(
            "{:<32} {:<12} {:>9.1}",
            r.unit.name,
            r.unit.status.to_string(),
            r.elapsed.as_secs_f64()
        );
    }
    for r in report
        .units
        .iter()
        .filter(|r| r.unit.status != RenderStatus::Success)
    {
        if let Some(stderr) = r.stderr.as_deref().filter(|s| !s.trim().is_empty()) {
            eprintln!("--- {} ({}) ---", r.unit.name, r.unit.status);
            eprintln!("{}", stderr.trim_end());
        }
    }

    match &report.concat_list {
        Some(list) => print_merge_hint(layout, &args.project, &report.manifest, list),
        None => eprintln!("nothing to concatenate"),
    }

    if args.strict && !report.all_succeeded() {
        anyhow::bail!(
            "{} of {} scenes did not render",
            report.units.len() - report.count(RenderStatus::Success),
            report.units.len()
        );
    }
    Ok(())
}

fn cmd_concat(layout: &ProjectLayout, args: ConcatArgs) -> anyhow::Result<()> {
    let manifest = RenderManifest::for_project(layout, &args.project, args.quality.into())?;
    match manifest.write_concat_list()? {
        Some(list) => print_merge_hint(layout, &args.project, &manifest, &list),
        None => eprintln!("nothing to concatenate"),
    }
    Ok(())
}

fn print_merge_hint(
    layout: &ProjectLayout,
    project: &str,
    manifest: &RenderManifest,
    list: &std::path::Path,
) {
    let merged = std::path::absolute(layout.merged_output(project))
        .unwrap_or_else(|_| layout.merged_output(project));
    eprintln!("wrote {} ({} scenes)", list.display(), manifest.units().len());
    eprintln!("merge with:");
    eprintln!("  cd {}", manifest.output_dir().display());
    eprintln!("  ffmpeg {}", manifest.merge_args(&merged).join(" "));
}

fn cmd_voice(layout: &ProjectLayout, args: VoiceArgs) -> anyhow::Result<()> {
    let client = VoicevoxClient::new(VoicevoxOpts {
        base_url: args.voicevox_url,
        speed_scale: args.speed,
        timeout: Duration::from_secs(args.request_timeout),
    })?;
    let (generated, map_path) = narrascene::generate_for_project(
        layout,
        &args.project,
        &client,
        &SpeakerTable::default(),
    )?;
    eprintln!(
        "wrote {} ({} clips, {} skipped)",
        map_path.display(),
        generated.map.clip_count(),
        generated.skipped
    );
    Ok(())
}

fn cmd_subtitles(layout: &ProjectLayout, args: SubtitlesArgs) -> anyhow::Result<()> {
    let policy = match args.policy {
        PolicyChoice::Windowed => MatchPolicy::windowed(),
        PolicyChoice::Sequential => MatchPolicy::Sequential,
        PolicyChoice::Global => MatchPolicy::global(if args.consume_global {
            GlobalReuse::ConsumeMatched
        } else {
            GlobalReuse::AllowRematch
        }),
    };
    let written =
        narrascene::write_project_subtitles(layout, &args.project, policy, args.fallback)?;
    for (scene, path) in &written {
        eprintln!(
            "wrote {} ({}/{} captions voiced)",
            path.display(),
            scene.matched,
            scene.sheet.cues().len()
        );
    }
    Ok(())
}
