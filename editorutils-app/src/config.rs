//! Settings
//!
//! Layered with the `config` crate: built-in defaults, the user config file,
//! an explicit `--config` file, then `EDITORUTILS_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use editorutils_core::directory::Directory;
use editorutils_core::paths::{ContentRoot, ContentRoots};
use editorutils_core::plugin::{discover_plugin_roots, find_project_file};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::build::{OrchestratorConfig, build_tool_path};

const DEFAULT_SETTINGS: &str = r#"
poll_interval_ms = 1000
capture_output = true
"#;

const ENV_PREFIX: &str = "EDITORUTILS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("`{0}` is not set")]
    Missing(&'static str),
    #[error("no .uproject file found in {0}")]
    ProjectNotFound(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorUtilsConfig {
    /// Engine install, the directory holding `Binaries/`
    pub engine_dir: Option<PathBuf>,
    /// The .uproject file, or a directory containing one
    pub project_file: Option<PathBuf>,
    /// Project content directory, `<project>/Content` when unset
    pub content_dir: Option<PathBuf>,
    /// Project plugins directory, `<project>/Plugins` when unset
    pub plugins_dir: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub capture_output: bool,
    /// Content roots registered on top of the discovered plugins
    pub plugins: Vec<ContentRoot>,
}

impl Default for EditorUtilsConfig {
    fn default() -> Self {
        Self {
            engine_dir: None,
            project_file: None,
            content_dir: None,
            plugins_dir: None,
            poll_interval_ms: 1000,
            capture_output: true,
            plugins: Vec::new(),
        }
    }
}

impl EditorUtilsConfig {
    /// Load every layer. `explicit` must exist when given.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::layered(Directory::config_file().as_deref(), explicit, true)
    }

    /// Load defaults plus a single file, ignoring the user config and the
    /// environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::layered(None, Some(path), false)
    }

    fn layered(
        user_file: Option<&Path>,
        explicit: Option<&Path>,
        with_env: bool,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            DEFAULT_SETTINGS,
            config::FileFormat::Toml,
        ));

        if let Some(path) = user_file {
            debug!("Reading user settings from {}", path.display());
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(path) = explicit {
            info!("Reading settings from {}", path.display());
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        if with_env {
            builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            poll_interval: self.poll_interval(),
            capture_output: self.capture_output,
        }
    }

    /// The project file, looked up in the directory when `project_file`
    /// names one.
    pub fn resolved_project_file(&self) -> Result<PathBuf, ConfigError> {
        let project = self
            .project_file
            .as_ref()
            .ok_or(ConfigError::Missing("project_file"))?;
        if project.is_dir() {
            find_project_file(project).ok_or_else(|| ConfigError::ProjectNotFound(project.clone()))
        } else {
            Ok(project.clone())
        }
    }

    pub fn resolved_build_tool(&self) -> Result<PathBuf, ConfigError> {
        let engine = self
            .engine_dir
            .as_ref()
            .ok_or(ConfigError::Missing("engine_dir"))?;
        Ok(build_tool_path(engine))
    }

    /// Content roots of the project: the primary content directory, every
    /// enabled plugin found under the plugins directory, then the roots
    /// listed in `plugins`.
    pub fn content_roots(&self) -> Result<ContentRoots, ConfigError> {
        let project_dir = match self.resolved_project_file() {
            Ok(project) => project.parent().map(Path::to_path_buf),
            Err(ConfigError::Missing(_)) => None,
            Err(e) => return Err(e),
        };

        let content_dir = match (&self.content_dir, &project_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(project)) => project.join("Content"),
            (None, None) => return Err(ConfigError::Missing("content_dir")),
        };
        let plugins_dir = match (&self.plugins_dir, &project_dir) {
            (Some(dir), _) => dir.clone(),
            (None, Some(project)) => project.join("Plugins"),
            (None, None) => return Err(ConfigError::Missing("plugins_dir")),
        };

        let mut roots = ContentRoots::new(content_dir, &plugins_dir);
        for root in discover_plugin_roots(&plugins_dir) {
            roots.add_root(root);
        }
        for root in &self.plugins {
            roots.add_root(ContentRoot::new(root.name.clone(), root.content_dir.clone()));
        }
        Ok(roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_settings(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("editorutils.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(&dir, "");
        let config = EditorUtilsConfig::from_file(&path).unwrap();
        assert_eq!(config, EditorUtilsConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_settings(
            &dir,
            r#"
engine_dir = "/opt/UE/Engine"
poll_interval_ms = 250
capture_output = false

[[plugins]]
name = "Extra"
content_dir = "/assets/Extra"
"#,
        );
        let config = EditorUtilsConfig::from_file(&path).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert!(!config.orchestrator_config().capture_output);
        assert_eq!(config.plugins.len(), 1);
        assert!(
            config
                .resolved_build_tool()
                .unwrap()
                .starts_with("/opt/UE/Engine/Binaries/DotNET/UnrealBuildTool")
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = EditorUtilsConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_missing_engine_dir() {
        let config = EditorUtilsConfig::default();
        assert!(matches!(
            config.resolved_build_tool(),
            Err(ConfigError::Missing("engine_dir"))
        ));
    }

    #[test]
    fn test_content_roots_from_project() {
        let dir = TempDir::new().unwrap();
        let project_dir = dir.path().join("Demo");
        let plugin_dir = project_dir.join("Plugins").join("Foliage");
        fs::create_dir_all(plugin_dir.join("Content")).unwrap();
        fs::write(
            plugin_dir.join("Foliage.uplugin"),
            r#"{"FriendlyName": "Foliage", "CanContainContent": true}"#,
        )
        .unwrap();
        fs::write(project_dir.join("Demo.uproject"), "{}").unwrap();

        let config = EditorUtilsConfig {
            project_file: Some(project_dir.clone()),
            plugins: vec![ContentRoot::new("Extra", dir.path().join("Extra"))],
            ..Default::default()
        };

        assert_eq!(
            config.resolved_project_file().unwrap(),
            project_dir.join("Demo.uproject")
        );
        let roots = config.content_roots().unwrap();
        assert_eq!(roots.primary(), project_dir.join("Content"));
        assert!(roots.root("Foliage").is_some());
        assert!(roots.root("Extra").is_some());
    }

    #[test]
    fn test_content_roots_need_a_project_or_dirs() {
        let config = EditorUtilsConfig::default();
        assert!(matches!(
            config.content_roots(),
            Err(ConfigError::Missing("content_dir"))
        ));
    }
}
