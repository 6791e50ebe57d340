//! Saving assets into packages
//!
//! [`save_asset_to_package`] places an object into the package matching a
//! directory under one of the content roots, registers it with the asset
//! registry and writes the package file through a [`PackageStore`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::asset_registry::{is_asset_registered, AssetRegistry};
use crate::error::{PackageError, Result};
use crate::paths::{ensure_asset_extension, join_package_path, ContentRoots};

bitflags! {
    /// Flags applied to the top level object when saving
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ObjectFlags: u32 {
        const PUBLIC     = 1 << 0;
        const STANDALONE = 1 << 1;
        const TRANSIENT  = 1 << 2;
    }
}

impl Default for ObjectFlags {
    fn default() -> Self {
        ObjectFlags::PUBLIC | ObjectFlags::STANDALONE
    }
}

/// An in-memory object that can be saved as an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetObject {
    pub name: String,
    pub class: String,
    /// Package the object currently lives in
    pub outer: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    pub dirty: bool,
}

impl AssetObject {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            outer: None,
            properties: serde_json::Map::new(),
            dirty: false,
        }
    }

    pub fn with_property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    /// Rename the object and move it into `package`.
    pub fn rename(&mut self, name: &str, package: &str) {
        self.name = name.to_string();
        self.outer = Some(package.to_string());
    }

    pub fn mark_package_dirty(&mut self) {
        self.dirty = true;
    }
}

/// A package addressed by its package path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub objects: Vec<String>,
    pub dirty: bool,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            dirty: false,
        }
    }

    pub fn add_object(&mut self, object_name: &str) {
        if !self.objects.iter().any(|o| o == object_name) {
            self.objects.push(object_name.to_string());
        }
    }
}

/// Package storage capability
pub trait PackageStore: Send + Sync {
    fn find_package(&self, package_name: &str) -> Option<Package>;

    fn create_package(&self, package_name: &str) -> Option<Package>;

    /// Write `package` with `object` as its top level asset to `file_path`.
    fn save_package(
        &self,
        package: &Package,
        object: &AssetObject,
        flags: ObjectFlags,
        file_path: &Path,
    ) -> bool;
}

/// On-disk layout written by [`FilePackageStore`]
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedPackage {
    pub package: String,
    pub flags: ObjectFlags,
    pub object: AssetObject,
}

/// Keeps packages in memory and writes saved packages as JSON documents
#[derive(Default)]
pub struct FilePackageStore {
    packages: RwLock<HashMap<String, Package>>,
}

impl FilePackageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(file_path: &Path) -> Result<SavedPackage> {
        let content = fs::read(file_path).map_err(|source| PackageError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&content).map_err(|e| PackageError::Io {
            path: file_path.to_path_buf(),
            source: e.into(),
        })
    }
}

impl PackageStore for FilePackageStore {
    fn find_package(&self, package_name: &str) -> Option<Package> {
        self.packages.read().get(package_name).cloned()
    }

    fn create_package(&self, package_name: &str) -> Option<Package> {
        if package_name.is_empty() || !package_name.starts_with('/') {
            return None;
        }
        let package = Package::new(package_name);
        self.packages
            .write()
            .insert(package_name.to_string(), package.clone());
        Some(package)
    }

    fn save_package(
        &self,
        package: &Package,
        object: &AssetObject,
        flags: ObjectFlags,
        file_path: &Path,
    ) -> bool {
        let saved = SavedPackage {
            package: package.name.clone(),
            flags,
            object: object.clone(),
        };
        let bytes = match serde_json::to_vec_pretty(&saved) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to serialize package {}: {}", package.name, e);
                return false;
            }
        };
        if let Err(e) = fs::write(file_path, bytes) {
            error!("Failed to write {}: {}", file_path.display(), e);
            return false;
        }

        let mut stored = package.clone();
        stored.dirty = false;
        self.packages.write().insert(package.name.clone(), stored);
        true
    }
}

/// Capabilities needed to save assets
pub struct PackageContext<'a> {
    pub roots: &'a ContentRoots,
    pub store: &'a dyn PackageStore,
    pub registry: &'a dyn AssetRegistry,
}

/// Save `object` as `file_name` inside the package directory matching
/// `save_dir`.
///
/// The package is created when it does not exist yet, and the directory is
/// created when missing. The object is registered with the asset registry
/// unless it is already known.
pub fn save_asset_to_package(
    ctx: &PackageContext<'_>,
    object: &mut AssetObject,
    save_dir: &Path,
    file_name: &str,
    flags: ObjectFlags,
) -> Result<Package> {
    if file_name.is_empty() {
        error!("File name is empty");
        return Err(PackageError::InvalidInput("file name"));
    }
    // Dots separate the object name in object paths, slashes separate packages
    if file_name.contains(['.', '/', '\\']) {
        error!("Invalid asset name: {}", file_name);
        return Err(PackageError::InvalidAssetName(file_name.to_string()));
    }

    let package_dir = ctx.roots.file_path_to_package_path(save_dir).inspect_err(|_| {
        error!(
            "Save directory is not inside any recognized content directory: {}",
            save_dir.display()
        );
    })?;

    let full_package_path = join_package_path(&package_dir, file_name);
    info!("Full package path: {}", full_package_path);

    let mut package = match ctx.store.find_package(&full_package_path) {
        Some(package) => package,
        None => {
            let package = ctx.store.create_package(&full_package_path).ok_or_else(|| {
                error!("Failed to create package: {}", full_package_path);
                PackageError::CreateFailed(full_package_path.clone())
            })?;
            info!("Package created: {}", full_package_path);
            package
        }
    };

    object.rename(file_name, &full_package_path);
    package.add_object(file_name);

    if !is_asset_registered(ctx.registry, &full_package_path) {
        ctx.registry.asset_created(object, &full_package_path);
    }

    object.mark_package_dirty();
    package.dirty = true;

    if !save_dir.is_dir() {
        fs::create_dir_all(save_dir).map_err(|source| {
            error!("Failed to create directory {}: {}", save_dir.display(), source);
            PackageError::Io {
                path: save_dir.to_path_buf(),
                source,
            }
        })?;
        info!("Created directory: {}", save_dir.display());
    }

    let file_path = PathBuf::from(ensure_asset_extension(
        &save_dir.join(file_name).to_string_lossy(),
    ));

    if !ctx.store.save_package(&package, object, flags, &file_path) {
        error!("Failed to save package: {}", file_path.display());
        return Err(PackageError::SaveFailed(file_path));
    }
    info!("Successfully saved package: {}", file_path.display());

    object.dirty = false;
    package.dirty = false;
    Ok(package)
}
