//! Plugin and project discovery
//!
//! Scans a project's `Plugins` directory for `.uplugin` descriptors so their
//! content directories can be registered as secondary content roots.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::paths::ContentRoot;

/// .uplugin file structure (partial - we only need what affects content roots)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpluginFile {
    #[serde(default)]
    friendly_name: Option<String>,
    #[serde(default = "default_enabled")]
    enabled_by_default: bool,
    #[serde(default)]
    can_contain_content: Option<bool>,
}

fn default_enabled() -> bool {
    true
}

/// A plugin found under the plugins directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPlugin {
    pub name: String,
    pub friendly_name: Option<String>,
    pub descriptor: PathBuf,
    pub root: ContentRoot,
}

/// Find every enabled plugin with a content directory.
///
/// A plugin is a direct child directory of `plugins_dir` containing
/// `<Name>.uplugin` and a `Content` directory. Unreadable descriptors are
/// skipped with a warning. Results are sorted by name.
pub fn discover_plugins(plugins_dir: &Path) -> Vec<DiscoveredPlugin> {
    let mut plugins = Vec::new();

    let Ok(entries) = fs::read_dir(plugins_dir) else {
        tracing::debug!("No plugins directory at {}", plugins_dir.display());
        return plugins;
    };

    for entry in entries.flatten() {
        let plugin_dir = entry.path();
        if !plugin_dir.is_dir() {
            continue;
        }

        let Some(descriptor) = find_file_with_extension(&plugin_dir, "uplugin") else {
            continue;
        };
        let Some(name) = descriptor
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
        else {
            continue;
        };

        let uplugin = match read_uplugin(&descriptor) {
            Ok(uplugin) => uplugin,
            Err(e) => {
                tracing::warn!("Skipping plugin {}: {}", name, e);
                continue;
            }
        };
        if !uplugin.enabled_by_default || uplugin.can_contain_content == Some(false) {
            tracing::debug!("Plugin {} is disabled or has no content", name);
            continue;
        }

        let content_dir = plugin_dir.join("Content");
        if !content_dir.is_dir() {
            continue;
        }

        plugins.push(DiscoveredPlugin {
            root: ContentRoot::new(name.clone(), content_dir),
            name,
            friendly_name: uplugin.friendly_name,
            descriptor,
        });
    }

    plugins.sort_by(|a, b| a.name.cmp(&b.name));
    plugins
}

/// Content roots of every enabled plugin, see [`discover_plugins`].
pub fn discover_plugin_roots(plugins_dir: &Path) -> Vec<ContentRoot> {
    discover_plugins(plugins_dir)
        .into_iter()
        .map(|p| p.root)
        .collect()
}

/// Find the .uproject file in a directory
pub fn find_project_file(path: &Path) -> Option<PathBuf> {
    if !path.is_dir() {
        return None;
    }
    find_file_with_extension(path, "uproject")
}

fn find_file_with_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == extension))
        .collect();
    matches.sort();
    matches.into_iter().next()
}

fn read_uplugin(path: &Path) -> Result<UpluginFile, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read .uplugin file: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("Failed to parse .uplugin JSON: {}", e))
}
