//! Asset registry capability
//!
//! The registry indexes known assets by object path (`/Game/Dir/Name.Name`).
//! The host owns the real registry; [`InMemoryAssetRegistry`] is used by the
//! CLI and the tests.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

use crate::package::AssetObject;

/// Registry entry for a single asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetData {
    pub object_path: String,
    pub package_name: String,
    pub asset_name: String,
    pub asset_class: String,
}

impl AssetData {
    pub fn new(package_name: &str, asset_name: &str, asset_class: &str) -> Self {
        Self {
            object_path: format!("{package_name}.{asset_name}"),
            package_name: package_name.to_string(),
            asset_name: asset_name.to_string(),
            asset_class: asset_class.to_string(),
        }
    }
}

/// Index of known assets
pub trait AssetRegistry: Send + Sync {
    /// Look up an asset by object path.
    fn get_asset_by_object_path(&self, object_path: &str) -> Option<AssetData>;

    /// Notify the registry that a new asset was created in a package.
    fn asset_created(&self, object: &AssetObject, package_name: &str);
}

/// Object path for a package path.
///
/// Paths that already name an object (`/Game/A.A`) are returned unchanged,
/// otherwise the asset is assumed to be named after its package.
pub fn object_path_for(asset_path: &str) -> String {
    let last_segment = asset_path.rsplit('/').next().unwrap_or_default();
    if last_segment.contains('.') {
        asset_path.to_string()
    } else {
        format!("{asset_path}.{last_segment}")
    }
}

/// Check whether the registry already knows the asset at `asset_path`.
pub fn is_asset_registered(registry: &dyn AssetRegistry, asset_path: &str) -> bool {
    if asset_path.is_empty() {
        return false;
    }
    registry
        .get_asset_by_object_path(&object_path_for(asset_path))
        .is_some()
}

/// Thread-safe registry kept in memory
#[derive(Default)]
pub struct InMemoryAssetRegistry {
    assets: RwLock<HashMap<String, AssetData>>,
}

impl InMemoryAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    pub fn insert(&self, data: AssetData) {
        self.assets.write().insert(data.object_path.clone(), data);
    }
}

impl AssetRegistry for InMemoryAssetRegistry {
    fn get_asset_by_object_path(&self, object_path: &str) -> Option<AssetData> {
        self.assets.read().get(object_path).cloned()
    }

    fn asset_created(&self, object: &AssetObject, package_name: &str) {
        tracing::debug!("Registering asset {} in {}", object.name, package_name);
        self.insert(AssetData::new(package_name, &object.name, &object.class));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_for() {
        assert_eq!(object_path_for("/Game/Maps/Intro"), "/Game/Maps/Intro.Intro");
        assert_eq!(object_path_for("/Game/Maps/Intro.Intro"), "/Game/Maps/Intro.Intro");
    }

    #[test]
    fn test_is_asset_registered() {
        let registry = InMemoryAssetRegistry::new();
        assert!(!is_asset_registered(&registry, "/Game/Data/Table"));

        let object = AssetObject::new("Table", "DataTable");
        registry.asset_created(&object, "/Game/Data/Table");

        assert!(is_asset_registered(&registry, "/Game/Data/Table"));
        assert!(is_asset_registered(&registry, "/Game/Data/Table.Table"));
        assert!(!is_asset_registered(&registry, "/Game/Data/Other"));
        assert!(!is_asset_registered(&registry, ""));
        assert_eq!(registry.len(), 1);
    }
}
