use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use editorutils_core::directory::Directory;
use editorutils_core::meta::VERSION;
use editorutils_core::paths::{ensure_asset_extension, module_name_from_path};
use editorutils_core::plugin::discover_plugins;
use tracing::info;

use crate::build::{
    BuildOrchestrator, execute_build_and_hot_reload, project_files_request,
    start_build_and_restart,
};
use crate::config::EditorUtilsConfig;
use crate::foreground::Foreground;
use crate::host::{EditorHost, ProcessHost, relaunch};
use crate::logging::{LogGuard, init_logging};
use crate::notification::{BuildNotification, CompletionState, NotificationSnapshot};

#[derive(Parser)]
#[clap(name = "editorutils")]
#[clap(version = VERSION)]
#[clap(about = "Package path and build helpers for engine projects")]
struct Cli {
    /// Settings file layered over the user settings
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a file path to a package path
    PackagePath { file: PathBuf },

    /// Convert a package path to a file path
    FilePath {
        package: String,
        /// Append the asset extension
        #[arg(long)]
        with_extension: bool,
    },

    /// Print the module a source file belongs to
    ModuleName { path: String },

    /// Append the asset extension when missing
    EnsureExt { path: String },

    /// List plugins with content
    Plugins,

    /// Regenerate the project files with the build tool
    Build {
        /// Restart the editor on the project once the build succeeded
        #[arg(long, conflicts_with = "in_place")]
        restart: bool,
        /// Build synchronously and hot reload instead
        #[arg(long)]
        in_place: bool,
    },

    /// Launch a program and exit
    Relaunch {
        executable: PathBuf,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

pub fn launch() -> Result<()> {
    let cli = Cli::parse();
    let log_guard = init_logging(Directory::logs_directory().as_deref());
    info!("Starting editorutils {}", VERSION);

    let load_config = || EditorUtilsConfig::load(cli.config.as_deref());

    match cli.command {
        Command::PackagePath { file } => {
            let roots = load_config()?.content_roots()?;
            println!("{}", roots.file_path_to_package_path(&file)?);
        }
        Command::FilePath {
            package,
            with_extension,
        } => {
            let roots = load_config()?.content_roots()?;
            let path = roots.package_path_to_file_path(&package)?;
            if with_extension {
                println!("{}", ensure_asset_extension(&path.to_string_lossy()));
            } else {
                println!("{}", path.display());
            }
        }
        Command::ModuleName { path } => match module_name_from_path(&path) {
            Some(module) => println!("{module}"),
            None => bail!("no module in {path}"),
        },
        Command::EnsureExt { path } => {
            println!("{}", ensure_asset_extension(&path));
        }
        Command::Plugins => {
            let roots = load_config()?.content_roots()?;
            for plugin in discover_plugins(roots.plugins_dir()) {
                println!("{}\t{}", plugin.name, plugin.root.content_dir.display());
            }
        }
        Command::Build { restart, in_place } => {
            build(&load_config()?, restart, in_place, &log_guard)?;
        }
        Command::Relaunch { executable, args } => {
            let host = ProcessHost::default().with_log_guard(log_guard.clone());
            relaunch(&host, &executable, &args)
                .with_context(|| format!("failed to launch {}", executable.display()))?;
        }
    }

    Ok(())
}

fn build(
    config: &EditorUtilsConfig,
    restart: bool,
    in_place: bool,
    log_guard: &LogGuard,
) -> Result<()> {
    let build_tool = config.resolved_build_tool()?;
    let project = config.resolved_project_file()?;

    let notification = Arc::new(BuildNotification::new().on_update(print_status));

    if in_place {
        let host = ProcessHost::with_build(project_files_request(&build_tool, &project))
            .with_log_guard(log_guard.clone());
        execute_build_and_hot_reload(&host, notification.as_ref());
        return finish(&notification);
    }

    let (handle, foreground) = Foreground::new();
    let orchestrator = BuildOrchestrator::new(handle, config.orchestrator_config());

    let build = if restart {
        let host: Arc<dyn EditorHost> =
            Arc::new(ProcessHost::default().with_log_guard(log_guard.clone()));
        start_build_and_restart(&orchestrator, host, &build_tool, &project, notification.clone())
    } else {
        let request = project_files_request(&build_tool, &project);
        orchestrator.run_build(request, notification.clone(), || {})
    };

    foreground.run_until(|| build.is_finished(), None);
    foreground.run_pending();

    finish(&notification)
}

fn finish(notification: &BuildNotification) -> Result<()> {
    let snapshot = notification.snapshot();
    if snapshot.state == CompletionState::Success {
        Ok(())
    } else {
        bail!("{}", snapshot.text)
    }
}

fn print_status(snapshot: &NotificationSnapshot) {
    match (&snapshot.state, &snapshot.detail) {
        (CompletionState::Pending, Some(detail)) => {
            println!("  {detail}");
        }
        _ => eprintln!("{}", snapshot.text),
    }
}
