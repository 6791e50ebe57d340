//! Build system types

use std::fmt;
use std::path::PathBuf;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// Identifier of a build started by an orchestrator
pub type BuildId = u64;

/// An external build process to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub executable: PathBuf,
    pub args: Vec<String>,
    /// Working directory, inherited from the caller when unset
    pub working_dir: Option<PathBuf>,
}

impl BuildRequest {
    pub fn new(executable: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            args,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Result of a build attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildOutcome {
    Success,
    /// The process ran and exited with a nonzero code
    Failed(i32),
    /// The process never ran
    FailedToStart(String),
}

impl BuildOutcome {
    /// Map a process exit code. A missing code (killed by a signal) is `-1`.
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => BuildOutcome::Success,
            Some(code) => BuildOutcome::Failed(code),
            None => BuildOutcome::Failed(-1),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::Success => write!(f, "succeeded"),
            BuildOutcome::Failed(code) => write!(f, "failed with exit code {}", code),
            BuildOutcome::FailedToStart(reason) => write!(f, "failed to start: {}", reason),
        }
    }
}

/// Receives build status.
///
/// The orchestrator calls every method from the foreground thread, so
/// implementations may update UI state directly.
pub trait StatusSink: Send + Sync {
    fn on_started(&self);

    fn on_progress(&self, message: &str);

    fn on_completed(&self, outcome: &BuildOutcome);
}

/// Build event, for consumers that prefer a channel over callbacks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildEvent {
    pub event_type: BuildEventType,
    pub message: String,
    pub progress: Option<f32>, // 0.0 - 100.0
    pub timestamp: u64,
}

/// Types of build events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildEventType {
    Started,
    Progress,
    Completed,
    Failed,
}

impl StatusSink for Sender<BuildEvent> {
    fn on_started(&self) {
        let _ = self.send(BuildEvent::new(BuildEventType::Started, "Build started".to_string()));
    }

    fn on_progress(&self, message: &str) {
        let mut event = BuildEvent::new(BuildEventType::Progress, message.to_string());
        event.progress = parse_build_progress(message);
        let _ = self.send(event);
    }

    fn on_completed(&self, outcome: &BuildOutcome) {
        let event_type = if outcome.is_success() {
            BuildEventType::Completed
        } else {
            BuildEventType::Failed
        };
        let mut event = BuildEvent::new(event_type, format!("Build {}", outcome));
        if outcome.is_success() {
            event.progress = Some(100.0);
        }
        let _ = self.send(event);
    }
}

impl BuildEvent {
    fn new(event_type: BuildEventType, message: String) -> Self {
        Self {
            event_type,
            message,
            progress: None,
            timestamp: now_ms(),
        }
    }
}

/// Parse build tool output line for progress info
pub fn parse_build_progress(line: &str) -> Option<f32> {
    // Progress looks like: [1/42] Compiling Module.cpp
    let rest = line.trim_start().strip_prefix('[')?;
    let (nums, _) = rest.split_once(']')?;
    let (current, total) = nums.split_once('/')?;
    let current = current.trim().parse::<f32>().ok()?;
    let total = total.trim().parse::<f32>().ok()?;
    if total > 0.0 {
        Some((current / total) * 100.0)
    } else {
        None
    }
}

/// Get current timestamp in ms
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
