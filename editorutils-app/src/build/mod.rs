//! Build system module
//!
//! Runs the engine's build tool for the editor:
//! - Non-blocking build execution with streaming output
//! - Status reporting on the foreground thread
//! - Editor restart or hot reload once a build succeeds

mod orchestrator;
mod types;
mod workflow;

pub use orchestrator::{
    is_executable,
    BuildHandle,
    BuildOrchestrator,
    OrchestratorConfig,
    DEFAULT_POLL_INTERVAL,
};

pub use types::{
    parse_build_progress,
    BuildEvent,
    BuildEventType,
    BuildId,
    BuildOutcome,
    BuildRequest,
    StatusSink,
};

pub use workflow::{
    build_tool_path,
    execute_build_and_hot_reload,
    project_files_request,
    start_build_and_restart,
};
