use std::{
    ffi::OsString,
    io::Read,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::{Arc, Mutex, mpsc},
    thread,
    time::{Duration, Instant},
};

use crate::{
    foundation::error::{NarrasceneError, NarrasceneResult},
    foundation::project::{Quality, source_stem},
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long pipe readers may keep running once the child is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// One render invocation handed to a [`RenderEngine`].
#[derive(Clone, Copy, Debug)]
pub struct RenderJob<'a> {
    /// Animation source file declaring the unit.
    pub source_file: &'a Path,
    /// Scene to render.
    pub unit: &'a str,
    /// Quality preset.
    pub quality: Quality,
    /// Isolated directory the engine writes all of its media into.
    pub workspace: &'a Path,
    /// Kill the invocation after this long.
    pub timeout: Option<Duration>,
}

/// What came back from one engine invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineOutcome {
    /// `true` when the engine exited successfully.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// `true` when the invocation was killed at its deadline.
    pub timed_out: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// External renderer, treated as a black box.
///
/// Implementations must be callable from several worker threads at once; every call gets its
/// own workspace.
pub trait RenderEngine: Send + Sync {
    /// Run the engine for one job and report how it exited.
    ///
    /// `Err` is reserved for failures to run the engine at all (e.g. the program is missing).
    fn render(&self, job: &RenderJob<'_>) -> NarrasceneResult<EngineOutcome>;

    /// Where a successful invocation leaves the unit's video.
    fn expected_output(&self, job: &RenderJob<'_>) -> PathBuf {
        job.workspace
            .join("videos")
            .join(source_stem(job.source_file))
            .join(job.quality.resolution_folder())
            .join(format!("{}.mp4", job.unit))
    }
}

/// Renders through the `manim` command line (or a compatible program).
#[derive(Clone, Debug)]
pub struct ManimEngine {
    /// Program to run.
    pub program: PathBuf,
    /// Directories appended to `PATH` for the child (e.g. a TeX distribution).
    pub extra_path: Vec<PathBuf>,
}

impl Default for ManimEngine {
    fn default() -> Self {
        Self {
            program: PathBuf::from("manim"),
            extra_path: Vec::new(),
        }
    }
}

impl ManimEngine {
    /// Engine running `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Append a directory to the child's `PATH`.
    pub fn with_extra_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extra_path.push(dir.into());
        self
    }

    fn command(&self, job: &RenderJob<'_>) -> NarrasceneResult<Command> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("render")
            .arg(job.quality.engine_flag())
            .arg("--media_dir")
            .arg(job.workspace)
            .arg(job.source_file)
            .arg(job.unit)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if !self.extra_path.is_empty() {
            let current = std::env::var_os("PATH").unwrap_or_default();
            let mut dirs: Vec<PathBuf> = std::env::split_paths(&current).collect();
            for extra in &self.extra_path {
                if !dirs.contains(extra) {
                    dirs.push(extra.clone());
                }
            }
            let joined: OsString = std::env::join_paths(dirs)
                .map_err(|e| NarrasceneError::validation(format!("invalid PATH entry: {e}")))?;
            cmd.env("PATH", joined);
        }

        Ok(cmd)
    }
}

impl RenderEngine for ManimEngine {
    fn render(&self, job: &RenderJob<'_>) -> NarrasceneResult<EngineOutcome> {
        let cmd = self.command(job)?;
        run_with_timeout(cmd, job.timeout)
    }
}

/// Run `cmd` to completion (or until `timeout`), capturing stdout and stderr.
///
/// The command must have piped stdout and stderr. On unix the child leads its own process group,
/// and at the deadline the whole group is killed, so helpers it spawned (ffmpeg, LaTeX) go with
/// it. Output is collected for a short grace period after the child exits, so a descendant that
/// still holds a pipe open cannot stall the caller.
pub fn run_with_timeout(
    mut cmd: Command,
    timeout: Option<Duration>,
) -> NarrasceneResult<EngineOutcome> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        cmd.process_group(0);
    }

    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd.spawn().map_err(|e| {
        NarrasceneError::render(format!(
            "failed to spawn '{program}' (is it installed and on PATH?): {e}"
        ))
    })?;

    // Drain both pipes concurrently so a chatty child never blocks on a full pipe.
    let stdout = child.stdout.take().map(Drain::spawn);
    let stderr = child.stderr.take().map(Drain::spawn);

    let deadline = timeout.map(|t| Instant::now() + t);
    let mut timed_out = false;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                kill_tree(&mut child);
                let _ = child.wait();
                return Err(NarrasceneError::render(format!(
                    "failed to wait for '{program}': {e}"
                )));
            }
        }
        if let Some(deadline) = deadline
            && Instant::now() >= deadline
        {
            timed_out = true;
            kill_tree(&mut child);
            break child.wait().map_err(|e| {
                NarrasceneError::render(format!("failed to reap '{program}': {e}"))
            })?;
        }
        thread::sleep(POLL_INTERVAL);
    };

    if timed_out {
        tracing::warn!(program = %program, pid = child.id(), "killed at deadline");
    }

    let drain_deadline = Instant::now() + DRAIN_GRACE;
    Ok(EngineOutcome {
        success: status.success() && !timed_out,
        exit_code: status.code(),
        timed_out,
        stdout: stdout.map(|d| d.collect(drain_deadline)).unwrap_or_default(),
        stderr: stderr.map(|d| d.collect(drain_deadline)).unwrap_or_default(),
    })
}

/// Kill the child's process group, falling back to the child alone.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        let killed = Command::new("kill")
            .args(["-KILL", "--", &group])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success());
        if killed {
            return;
        }
        tracing::debug!(pid = child.id(), "process group kill failed; killing child only");
    }
    let _ = child.kill();
}

/// Background reader of one child pipe.
///
/// Bytes land in a shared buffer as they arrive, so a reader that never sees end-of-file still
/// yields what was written before the deadline. The thread is detached if it outlives
/// [`Drain::collect`].
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    done: mpsc::Receiver<()>,
}

impl Drain {
    fn spawn(mut pipe: impl Read + Send + 'static) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&buf);
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Ok(0) | Err(_) => break,
                    Ok(n) => match sink.lock() {
                        Ok(mut b) => b.extend_from_slice(&chunk[..n]),
                        Err(_) => break,
                    },
                }
            }
            let _ = tx.send(());
        });
        Self { buf, done }
    }

    fn collect(self, deadline: Instant) -> String {
        let wait = deadline.saturating_duration_since(Instant::now());
        if self.done.recv_timeout(wait).is_err() {
            tracing::debug!("pipe still open after child exit; keeping partial output");
        }
        self.buf
            .lock()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
