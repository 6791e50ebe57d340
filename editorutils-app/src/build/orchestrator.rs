//! Build execution
//!
//! [`BuildOrchestrator::run_build`] returns immediately. The build process is
//! spawned and watched on a dedicated background thread, and every status
//! callback is posted back to the foreground thread.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::types::{BuildId, BuildOutcome, BuildRequest, StatusSink, parse_build_progress};
use crate::foreground::ForegroundHandle;

/// Default delay between liveness checks of a running build
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Delay between liveness checks of the build process
    pub poll_interval: Duration,
    /// Pipe stdout/stderr and report each line through `on_progress`
    pub capture_output: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            capture_output: true,
        }
    }
}

/// Handle to a submitted build.
///
/// Dropping it does not affect the build.
pub struct BuildHandle {
    id: BuildId,
    watcher: Option<JoinHandle<()>>,
}

impl BuildHandle {
    pub fn id(&self) -> BuildId {
        self.id
    }

    /// True once the watcher has posted everything it is going to post.
    pub fn is_finished(&self) -> bool {
        self.watcher.as_ref().is_none_or(|w| w.is_finished())
    }

    /// Block until the watcher thread exits.
    pub fn join(self) {
        if let Some(watcher) = self.watcher {
            let _ = watcher.join();
        }
    }
}

/// Runs external builds without blocking the caller
pub struct BuildOrchestrator {
    foreground: ForegroundHandle,
    config: OrchestratorConfig,
    next_id: AtomicU64,
}

impl BuildOrchestrator {
    pub fn new(foreground: ForegroundHandle, config: OrchestratorConfig) -> Self {
        Self {
            foreground,
            config,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Start a build.
    ///
    /// `sink` receives `on_started`, any `on_progress` lines and exactly one
    /// `on_completed`, all on the foreground thread. `on_success` runs on the
    /// foreground thread after `on_completed`, only when the build exited
    /// with code 0. Concurrent builds are independent of each other.
    pub fn run_build<F>(
        &self,
        request: BuildRequest,
        sink: Arc<dyn StatusSink>,
        on_success: F,
    ) -> BuildHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if !is_executable(&request.executable) {
            error!(
                "Build tool does not exist or is not executable: {}",
                request.executable.display()
            );
            post_completed(
                &self.foreground,
                &sink,
                BuildOutcome::FailedToStart("missing executable".to_string()),
            );
            return BuildHandle { id, watcher: None };
        }

        let watcher = BuildWatcher {
            id,
            request,
            sink: sink.clone(),
            foreground: self.foreground.clone(),
            config: self.config.clone(),
        };

        let spawned = thread::Builder::new()
            .name(format!("BuildWatcher-{}", id))
            .spawn(move || watcher.run(on_success));

        match spawned {
            Ok(handle) => BuildHandle {
                id,
                watcher: Some(handle),
            },
            Err(e) => {
                error!("Failed to spawn build watcher thread: {}", e);
                post_completed(
                    &self.foreground,
                    &sink,
                    BuildOutcome::FailedToStart(format!("failed to spawn watcher: {}", e)),
                );
                BuildHandle { id, watcher: None }
            }
        }
    }
}

/// State owned by the background thread of one build
struct BuildWatcher {
    id: BuildId,
    request: BuildRequest,
    sink: Arc<dyn StatusSink>,
    foreground: ForegroundHandle,
    config: OrchestratorConfig,
}

impl BuildWatcher {
    fn run(self, on_success: impl FnOnce() + Send + 'static) {
        let start_time = Instant::now();
        info!(
            build = self.id,
            executable = %self.request.executable.display(),
            args = ?self.request.args,
            "Starting build process"
        );

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(build = self.id, "Failed to start build process: {}", e);
                post_completed(
                    &self.foreground,
                    &self.sink,
                    BuildOutcome::FailedToStart(format!("failed to start build process: {}", e)),
                );
                return;
            }
        };

        let sink = self.sink.clone();
        self.foreground.post(move || sink.on_started());

        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.extend(self.forward_lines("stdout", stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.extend(self.forward_lines("stderr", stderr));
        }

        let outcome = self.wait(&mut child);

        // Every progress line is posted before the completion
        for reader in readers {
            let _ = reader.join();
        }

        let duration = start_time.elapsed();
        if outcome.is_success() {
            info!(build = self.id, "Build completed in {:.1}s", duration.as_secs_f32());
        } else {
            error!(build = self.id, "Build {}. Check the logs for more details.", outcome);
        }

        let succeeded = outcome.is_success();
        post_completed(&self.foreground, &self.sink, outcome);
        if succeeded {
            self.foreground.post(on_success);
        }
    }

    fn spawn(&self) -> std::io::Result<Child> {
        let mut cmd = Command::new(&self.request.executable);
        cmd.args(&self.request.args).stdin(Stdio::null());

        if let Some(dir) = &self.request.working_dir {
            cmd.current_dir(dir);
        }

        if self.config.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        // Keep the build tool from popping up a console window
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
        }

        cmd.spawn()
    }

    /// Poll the process until it exits. There is no timeout.
    fn wait(&self, child: &mut Child) -> BuildOutcome {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return BuildOutcome::from_exit_code(status.code()),
                Ok(None) => thread::sleep(self.config.poll_interval),
                Err(e) => {
                    error!(build = self.id, "Lost track of build process: {}", e);
                    return BuildOutcome::Failed(-1);
                }
            }
        }
    }

    /// Stream a pipe line by line to `on_progress` on the foreground.
    fn forward_lines(
        &self,
        stream_name: &'static str,
        stream: impl Read + Send + 'static,
    ) -> Option<JoinHandle<()>> {
        let id = self.id;
        let sink = self.sink.clone();
        let foreground = self.foreground.clone();

        let spawned = thread::Builder::new()
            .name(format!("BuildOutput-{}-{}", id, stream_name))
            .spawn(move || {
                let mut reader = BufReader::new(stream);
                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) => break,
                        Ok(_) => {
                            let line = String::from_utf8_lossy(&buf)
                                .trim_end_matches(['\r', '\n'])
                                .to_string();
                            if let Some(progress) = parse_build_progress(&line) {
                                debug!(build = id, progress, "{}", line);
                            }
                            let sink = sink.clone();
                            foreground.post(move || sink.on_progress(&line));
                        }
                        Err(e) => {
                            debug!(build = id, "Stopped reading {}: {}", stream_name, e);
                            break;
                        }
                    }
                }
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(build = id, "Failed to spawn {} reader: {}", stream_name, e);
                None
            }
        }
    }
}

fn post_completed(foreground: &ForegroundHandle, sink: &Arc<dyn StatusSink>, outcome: BuildOutcome) {
    let sink = sink.clone();
    foreground.post(move || sink.on_completed(&outcome));
}

/// Whether `path` is a regular file the current user may execute
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }

    #[cfg(not(unix))]
    {
        true
    }
}
