//! Editor host capability and relaunching
//!
//! Everything that touches the running application (its executable, exiting
//! it, building or reloading code inside it) goes through [`EditorHost`], so
//! callers pass the capability in explicitly.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{error, info, warn};

use crate::build::{BuildOutcome, BuildRequest};
use crate::logging::LogGuard;

/// The application hosting the editor tooling
pub trait EditorHost: Send + Sync {
    /// Path of the currently running executable
    fn executable_path(&self) -> io::Result<PathBuf>;

    /// Ask the application to exit with `code`. No confirmation, no cleanup
    /// callback.
    fn request_exit(&self, code: i32);

    /// Build code synchronously from inside the editor.
    fn exec_build(&self) -> BuildOutcome;

    /// Reload freshly built code into the running editor.
    fn hot_reload(&self);
}

/// Host for a standalone process
#[derive(Debug, Default)]
pub struct ProcessHost {
    /// Build run by [`EditorHost::exec_build`]
    pub build: Option<BuildRequest>,
    /// Flushed before exiting
    pub log_guard: LogGuard,
}

impl ProcessHost {
    pub fn with_build(build: BuildRequest) -> Self {
        Self {
            build: Some(build),
            ..Default::default()
        }
    }

    pub fn with_log_guard(mut self, log_guard: LogGuard) -> Self {
        self.log_guard = log_guard;
        self
    }

    /// Write out buffered log lines. Exiting skips every destructor.
    pub fn flush_logs(&self) {
        self.log_guard.flush();
    }
}

impl EditorHost for ProcessHost {
    fn executable_path(&self) -> io::Result<PathBuf> {
        std::env::current_exe()
    }

    fn request_exit(&self, code: i32) {
        info!("Exiting for relaunch with status {}", code);
        self.flush_logs();
        std::process::exit(code);
    }

    fn exec_build(&self) -> BuildOutcome {
        let Some(build) = &self.build else {
            return BuildOutcome::FailedToStart("no build configured".to_string());
        };

        let mut cmd = Command::new(&build.executable);
        cmd.args(&build.args);
        if let Some(dir) = &build.working_dir {
            cmd.current_dir(dir);
        }
        match cmd.status() {
            Ok(status) => BuildOutcome::from_exit_code(status.code()),
            Err(e) => BuildOutcome::FailedToStart(e.to_string()),
        }
    }

    fn hot_reload(&self) {
        // A standalone process has no loaded game modules to swap
        warn!("Hot reload is only available inside the editor");
    }
}

/// Launch `executable` with `args` and exit the current process.
///
/// The new process is detached and never waited on. Exit is requested even
/// when the launch failed, with status 1 instead of 0; the error is logged
/// and returned for hosts whose `request_exit` does not terminate
/// immediately.
pub fn relaunch(host: &dyn EditorHost, executable: &Path, args: &[String]) -> io::Result<u32> {
    info!("Relaunching {} {:?}", executable.display(), args);

    let launched = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|child| child.id());

    if let Err(e) = &launched {
        error!(
            "Failed to launch {}: {}. Exiting anyway.",
            executable.display(),
            e
        );
    }

    host.request_exit(if launched.is_ok() { 0 } else { 1 });
    launched
}

/// Restart the host executable with `project_path` as its only argument.
///
/// When the host cannot report its own executable nothing is launched and
/// the process keeps running.
pub fn restart_editor_with_project(host: &dyn EditorHost, project_path: &Path) -> io::Result<u32> {
    let editor_path = host.executable_path().inspect_err(|e| {
        error!("Cannot determine editor executable, not restarting: {}", e);
    })?;
    relaunch(
        host,
        &editor_path,
        &[project_path.to_string_lossy().to_string()],
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Host that records requests instead of acting on them
    pub struct FakeHost {
        pub executable: PathBuf,
        pub build_outcome: BuildOutcome,
        pub exit_codes: Mutex<Vec<i32>>,
        pub builds: AtomicUsize,
        pub reloads: AtomicUsize,
    }

    impl FakeHost {
        pub fn new(executable: impl Into<PathBuf>) -> Self {
            Self {
                executable: executable.into(),
                build_outcome: BuildOutcome::Success,
                exit_codes: Mutex::new(Vec::new()),
                builds: AtomicUsize::new(0),
                reloads: AtomicUsize::new(0),
            }
        }

        pub fn exits(&self) -> usize {
            self.exit_codes.lock().len()
        }
    }

    impl EditorHost for FakeHost {
        fn executable_path(&self) -> io::Result<PathBuf> {
            if self.executable.as_os_str().is_empty() {
                Err(io::Error::new(io::ErrorKind::NotFound, "no executable"))
            } else {
                Ok(self.executable.clone())
            }
        }

        fn request_exit(&self, code: i32) {
            self.exit_codes.lock().push(code);
        }

        fn exec_build(&self) -> BuildOutcome {
            self.builds.fetch_add(1, Ordering::SeqCst);
            self.build_outcome.clone()
        }

        fn hot_reload(&self) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::testing::FakeHost;
    use super::*;

    #[test]
    fn test_relaunch_spawns_then_exits() {
        let host = FakeHost::new("/bin/sh");
        let pid = relaunch(&host, Path::new("/bin/sh"), &["-c".to_string(), "exit 0".to_string()])
            .unwrap();
        assert!(pid > 0);
        assert_eq!(*host.exit_codes.lock(), [0]);
    }

    #[test]
    fn test_relaunch_exits_even_when_spawn_fails() {
        let host = FakeHost::new("/bin/sh");
        let result = relaunch(&host, Path::new("/no/such/editor"), &[]);
        assert!(result.is_err());
        assert_eq!(*host.exit_codes.lock(), [1]);
    }

    #[test]
    fn test_restart_with_project() {
        let dir = tempfile::TempDir::new().unwrap();
        // Empty script, so the relaunched shell exits right away
        let project = dir.path().join("Demo.uproject");
        std::fs::write(&project, "").unwrap();

        let host = FakeHost::new("/bin/sh");
        restart_editor_with_project(&host, &project).unwrap();
        assert_eq!(host.exits(), 1);
    }

    #[test]
    fn test_restart_without_executable_keeps_running() {
        let host = FakeHost::new("");
        assert!(restart_editor_with_project(&host, Path::new("/p/Demo.uproject")).is_err());
        assert_eq!(host.exits(), 0);
    }

    #[test]
    fn test_process_host_flushes_shared_log_guard() {
        let (_writer, guard) = tracing_appender::non_blocking(std::io::sink());
        let log_guard = LogGuard::new(Some(guard));
        let host = ProcessHost::default().with_log_guard(log_guard.clone());

        host.flush_logs();
        assert!(!log_guard.is_active());
    }

    #[test]
    fn test_process_host_exec_build() {
        let host = ProcessHost::with_build(BuildRequest::new(
            "/bin/sh",
            vec!["-c".to_string(), "exit 4".to_string()],
        ));
        assert_eq!(host.exec_build(), BuildOutcome::Failed(4));
        assert!(matches!(
            ProcessHost::default().exec_build(),
            BuildOutcome::FailedToStart(_)
        ));
    }
}
