//! Editor build workflows
//!
//! The two ways the editor rebuilds code: regenerating project files with the
//! engine's build tool and restarting, or compiling in place and hot
//! reloading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use super::orchestrator::{BuildHandle, BuildOrchestrator};
use super::types::{BuildOutcome, BuildRequest, StatusSink};
use crate::host::{EditorHost, restart_editor_with_project};

/// Location of UnrealBuildTool inside an engine install
pub fn build_tool_path(engine_dir: &Path) -> PathBuf {
    let file_name = if cfg!(windows) {
        "UnrealBuildTool.exe"
    } else {
        "UnrealBuildTool"
    };
    engine_dir
        .join("Binaries")
        .join("DotNET")
        .join("UnrealBuildTool")
        .join(file_name)
}

/// Request that regenerates the project files of `project_file`
pub fn project_files_request(build_tool: &Path, project_file: &Path) -> BuildRequest {
    let request = BuildRequest::new(
        build_tool,
        vec![
            project_file.to_string_lossy().to_string(),
            "-projectfiles".to_string(),
        ],
    );
    match project_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => request.with_working_dir(dir),
        _ => request,
    }
}

/// Regenerate project files in the background, then restart the editor on
/// `project_file` once the build succeeded.
pub fn start_build_and_restart(
    orchestrator: &BuildOrchestrator,
    host: Arc<dyn EditorHost>,
    build_tool: &Path,
    project_file: &Path,
    sink: Arc<dyn StatusSink>,
) -> BuildHandle {
    let request = project_files_request(build_tool, project_file);
    let project = project_file.to_path_buf();

    orchestrator.run_build(request, sink, move || {
        info!("Build succeeded, restarting editor with {}", project.display());
        if let Err(e) = restart_editor_with_project(host.as_ref(), &project) {
            error!("Failed to restart editor: {}", e);
        }
    })
}

/// Build inside the running editor and hot reload the result.
///
/// Blocks the calling thread, which must be the one owning `sink`.
pub fn execute_build_and_hot_reload(host: &dyn EditorHost, sink: &dyn StatusSink) -> BuildOutcome {
    sink.on_started();
    let outcome = host.exec_build();
    sink.on_completed(&outcome);

    if outcome.is_success() {
        info!("Build succeeded, hot reloading");
        host.hot_reload();
    } else {
        error!("In-editor build {}", outcome);
    }
    outcome
}
