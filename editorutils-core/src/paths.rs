//! Translation between filesystem paths and package paths
//!
//! A package path is the logical address of an asset, e.g. `/Game/Maps/Intro`.
//! The first segment is the root alias: `Game` for the project content
//! directory, or the plugin name for a plugin content directory.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{PackageError, Result};

/// Extension of saved package files
pub const ASSET_EXTENSION: &str = ".uasset";

/// Root alias of the project content directory
pub const PRIMARY_ROOT_ALIAS: &str = "Game";

/// Marker used by plugin package paths such as `/Game/Plugins/Name/...`
pub const PLUGINS_MARKER: &str = "Plugins/";

const SOURCE_MARKER: &str = "/Source/";
const PLUGIN_CONTENT_DIR: &str = "Content";

/// Append [`ASSET_EXTENSION`] unless the path already ends with it.
///
/// The check is case-sensitive, so `Foo.UASSET` gets a second extension.
pub fn ensure_asset_extension(path: &str) -> String {
    if path.ends_with(ASSET_EXTENSION) {
        path.to_string()
    } else {
        format!("{path}{ASSET_EXTENSION}")
    }
}

/// Extract the module name from a source file path.
///
/// The module is the first directory after `/Source/`, e.g.
/// `D:/Proj/Source/MyGame/Private/Foo.cpp` yields `MyGame`. When nothing
/// follows the module directory, as in `D:/Proj/Source/MyGame`, the rest of
/// the path is the module name. The editor returns an empty name there.
pub fn module_name_from_path(path: &str) -> Option<String> {
    let path = path.replace('\\', "/");
    let (_, after_source) = path.split_once(SOURCE_MARKER)?;
    let module = after_source.split('/').next().unwrap_or_default();
    if module.is_empty() {
        None
    } else {
        Some(module.to_string())
    }
}

/// Join a file name onto a package directory without doubling slashes.
pub fn join_package_path(dir: &str, name: &str) -> String {
    format!(
        "{}/{}",
        dir.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}

/// A named content directory, usually belonging to a plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRoot {
    /// Root alias used as the first package path segment
    pub name: String,
    /// Absolute path of the content directory
    pub content_dir: PathBuf,
}

impl ContentRoot {
    pub fn new(name: impl Into<String>, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            content_dir: normalize_path(&content_dir.into()),
        }
    }
}

/// The set of content directories known to the project
#[derive(Debug, Clone)]
pub struct ContentRoots {
    primary: PathBuf,
    plugins_dir: PathBuf,
    secondary: Vec<ContentRoot>,
}

impl ContentRoots {
    /// Create roots from the project content directory and the project
    /// plugins directory.
    pub fn new(primary: impl Into<PathBuf>, plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            primary: normalize_path(&primary.into()),
            plugins_dir: normalize_path(&plugins_dir.into()),
            secondary: Vec::new(),
        }
    }

    pub fn with_root(mut self, root: ContentRoot) -> Self {
        self.add_root(root);
        self
    }

    /// Register a secondary root. A root with an existing name replaces it.
    pub fn add_root(&mut self, root: ContentRoot) {
        if let Some(existing) = self.secondary.iter_mut().find(|r| r.name == root.name) {
            *existing = root;
        } else {
            self.secondary.push(root);
        }
    }

    pub fn primary(&self) -> &Path {
        &self.primary
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn secondary(&self) -> &[ContentRoot] {
        &self.secondary
    }

    pub fn root(&self, name: &str) -> Option<&ContentRoot> {
        self.secondary.iter().find(|r| r.name == name)
    }

    /// Content directory of a plugin, registered or conventional.
    pub fn plugin_content_dir(&self, plugin: &str) -> PathBuf {
        match self.root(plugin) {
            Some(root) => root.content_dir.clone(),
            None => self.plugins_dir.join(plugin).join(PLUGIN_CONTENT_DIR),
        }
    }

    /// Convert a filesystem path into a package path.
    ///
    /// `<content>/Maps/Intro` becomes `/Game/Maps/Intro` and
    /// `<plugin content>/Meshes/Rock` becomes `/PluginName/Meshes/Rock`.
    /// The primary root is checked before any plugin root.
    pub fn file_path_to_package_path(&self, file_path: impl AsRef<Path>) -> Result<String> {
        let file_path = file_path.as_ref();
        if file_path.as_os_str().is_empty() {
            return Err(PackageError::InvalidInput("file path"));
        }
        let file_path = normalize_path(file_path);
        debug!(content_dir = %self.primary.display(), "resolving package path");

        if let Ok(relative) = file_path.strip_prefix(&self.primary) {
            let package_path = package_path(PRIMARY_ROOT_ALIAS, relative);
            debug!(%package_path, "converted package path");
            return Ok(package_path);
        }

        for root in &self.secondary {
            if let Ok(relative) = file_path.strip_prefix(&root.content_dir) {
                let package_path = package_path(&root.name, relative);
                debug!(%package_path, plugin = %root.name, "converted plugin package path");
                return Ok(package_path);
            }
        }

        error!(
            "File path is not inside any recognized content or plugin directory: {}",
            file_path.display()
        );
        Err(PackageError::NotUnderContentRoot(file_path))
    }

    /// Convert a package path back into the filename of its package file.
    ///
    /// Paths containing `Plugins/<Name>/` resolve against that plugin's
    /// content directory, everything else goes through the root alias.
    pub fn package_path_to_file_path(&self, package_path: &str) -> Result<PathBuf> {
        if package_path.is_empty() {
            return Err(PackageError::InvalidInput("package path"));
        }

        if let Some(index) = package_path.find(PLUGINS_MARKER) {
            let plugin_relative = &package_path[index + PLUGINS_MARKER.len()..];
            return match plugin_relative.split_once('/') {
                Some((plugin, remaining)) if !plugin.is_empty() => Ok(self
                    .plugin_content_dir(plugin)
                    .join(ensure_asset_extension(remaining))),
                _ => {
                    error!("Invalid plugin path: {}", package_path);
                    Err(PackageError::InvalidPackagePath(package_path.to_string()))
                }
            };
        }

        self.long_package_name_to_filename(package_path)
    }

    fn long_package_name_to_filename(&self, package_path: &str) -> Result<PathBuf> {
        let trimmed = package_path.trim_start_matches('/');
        let Some((alias, remaining)) = trimmed.split_once('/') else {
            error!("Package path has no asset name: {}", package_path);
            return Err(PackageError::InvalidPackagePath(package_path.to_string()));
        };
        if remaining.is_empty() {
            error!("Package path has no asset name: {}", package_path);
            return Err(PackageError::InvalidPackagePath(package_path.to_string()));
        }

        let base = if alias == PRIMARY_ROOT_ALIAS {
            &self.primary
        } else if let Some(root) = self.root(alias) {
            &root.content_dir
        } else {
            error!("Package path does not start with a known root: {}", package_path);
            return Err(PackageError::UnknownRoot(package_path.to_string()));
        };

        Ok(base.join(ensure_asset_extension(remaining)))
    }
}

fn package_path(alias: &str, relative: &Path) -> String {
    let segments: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        format!("/{alias}")
    } else {
        format!("/{alias}/{}", segments.join("/"))
    }
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn roots() -> ContentRoots {
        ContentRoots::new("/Projects/Demo/Content", "/Projects/Demo/Plugins")
            .with_root(ContentRoot::new("Weather", "/Projects/Demo/Plugins/Weather/Content"))
            .with_root(ContentRoot::new("Shared", "/Libraries/Shared/Content"))
    }

    #[test]
    fn test_ensure_asset_extension() {
        assert_eq!(ensure_asset_extension("/a/Foo"), "/a/Foo.uasset");
        assert_eq!(ensure_asset_extension("/a/Foo.uasset"), "/a/Foo.uasset");
        assert_eq!(ensure_asset_extension(""), ".uasset");
        assert_eq!(ensure_asset_extension("Foo.UASSET"), "Foo.UASSET.uasset");
    }

    #[test]
    fn test_ensure_asset_extension_is_idempotent() {
        for s in ["", "x", "dir/Thing", "Thing.uasset", "Thing.uasse", ".uasset.uasset"] {
            let once = ensure_asset_extension(s);
            assert_eq!(ensure_asset_extension(&once), once);
        }
    }

    #[test]
    fn test_module_name_from_path() {
        assert_eq!(
            module_name_from_path("D:/Proj/Source/MyGame/Private/Foo.cpp").as_deref(),
            Some("MyGame")
        );
        assert_eq!(
            module_name_from_path("D:\\Proj\\Source\\Tools\\Tools.Build.cs").as_deref(),
            Some("Tools")
        );
        assert_eq!(module_name_from_path("/Proj/Source/Solo").as_deref(), Some("Solo"));
        assert_eq!(module_name_from_path("/Proj/Content/Maps"), None);
        assert_eq!(module_name_from_path("/Proj/Source/"), None);
    }

    #[test]
    fn test_primary_root_translation() {
        assert_eq!(
            roots().file_path_to_package_path("/Projects/Demo/Content/Foo/Bar").unwrap(),
            "/Game/Foo/Bar"
        );
        assert_eq!(
            roots().file_path_to_package_path("/Projects/Demo/Content/").unwrap(),
            "/Game"
        );
    }

    #[test]
    fn test_secondary_root_translation() {
        assert_eq!(
            roots().file_path_to_package_path("/Libraries/Shared/Content/Sub").unwrap(),
            "/Shared/Sub"
        );
        assert_eq!(
            roots()
                .file_path_to_package_path("/Projects/Demo/Plugins/Weather/Content/Rain/Drop")
                .unwrap(),
            "/Weather/Rain/Drop"
        );
    }

    #[test]
    fn test_translation_is_component_wise() {
        // A sibling directory sharing a string prefix is not inside the root
        let result = roots().file_path_to_package_path("/Projects/Demo/ContentBackup/Foo");
        assert!(matches!(result, Err(PackageError::NotUnderContentRoot(_))));
    }

    #[test]
    fn test_translation_normalizes_dots() {
        assert_eq!(
            roots()
                .file_path_to_package_path("/Projects/Demo/Content/./Maps/../Foo")
                .unwrap(),
            "/Game/Foo"
        );
    }

    #[test]
    #[traced_test]
    fn test_unknown_path_emits_one_diagnostic() {
        let result = roots().file_path_to_package_path("/Elsewhere/Foo");
        assert!(matches!(result, Err(PackageError::NotUnderContentRoot(_))));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|line| line.contains("not inside any recognized"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected exactly one diagnostic, got {n}")),
            }
        });
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            roots().file_path_to_package_path(""),
            Err(PackageError::InvalidInput(_))
        ));
        assert!(matches!(
            roots().package_path_to_file_path(""),
            Err(PackageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_plugin_marker_reverse_translation() {
        let path = roots()
            .package_path_to_file_path("/Game/Plugins/Weather/Thing")
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/Projects/Demo/Plugins/Weather/Content/Thing.uasset")
        );
    }

    #[test]
    fn test_plugin_marker_uses_registered_root() {
        let path = roots()
            .package_path_to_file_path("/Game/Plugins/Shared/Props/Crate")
            .unwrap();
        assert_eq!(path, PathBuf::from("/Libraries/Shared/Content/Props/Crate.uasset"));
    }

    #[test]
    fn test_plugin_marker_without_name_separator() {
        let result = roots().package_path_to_file_path("/Game/Plugins/Weather");
        assert!(matches!(result, Err(PackageError::InvalidPackagePath(_))));
    }

    #[test]
    fn test_default_reverse_translation() {
        assert_eq!(
            roots().package_path_to_file_path("/Game/Maps/Intro").unwrap(),
            PathBuf::from("/Projects/Demo/Content/Maps/Intro.uasset")
        );
        assert_eq!(
            roots().package_path_to_file_path("/Shared/Sub").unwrap(),
            PathBuf::from("/Libraries/Shared/Content/Sub.uasset")
        );
        assert!(matches!(
            roots().package_path_to_file_path("/Nowhere/Sub"),
            Err(PackageError::UnknownRoot(_))
        ));
        assert!(matches!(
            roots().package_path_to_file_path("/Game"),
            Err(PackageError::InvalidPackagePath(_))
        ));
    }

    #[test]
    fn test_round_trip_up_to_extension() {
        let roots = roots();
        for package in ["/Game/Foo/Bar", "/Shared/Sub", "/Weather/Rain/Drop"] {
            let file = roots.package_path_to_file_path(package).unwrap();
            assert_eq!(
                roots.file_path_to_package_path(&file).unwrap(),
                ensure_asset_extension(package)
            );
        }
    }

    #[test]
    fn test_join_package_path() {
        assert_eq!(join_package_path("/Game/", "Foo"), "/Game/Foo");
        assert_eq!(join_package_path("/Game", "/Foo"), "/Game/Foo");
    }

    #[test]
    fn test_add_root_replaces_by_name() {
        let mut roots = roots();
        roots.add_root(ContentRoot::new("Shared", "/Other/Content"));
        assert_eq!(roots.secondary().len(), 2);
        assert_eq!(roots.root("Shared").unwrap().content_dir, PathBuf::from("/Other/Content"));
    }
}
