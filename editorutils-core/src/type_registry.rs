//! Name-based type lookup
//!
//! Types are registered explicitly under `(module, name)` and looked up the
//! way the editor addresses them, through `/Script/<Module>.<Name>`.

use std::collections::HashMap;

use parking_lot::RwLock;
use strum_macros::{Display, EnumString};

/// Kind of a registered type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TypeKind {
    Struct,
    Class,
}

/// Handle to a registered type definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeHandle {
    pub kind: TypeKind,
    pub module: String,
    pub name: String,
}

impl TypeHandle {
    pub fn script_path(&self) -> String {
        script_path(&self.module, &self.name)
    }
}

/// `/Script/<module>.<name>`
pub fn script_path(module: &str, name: &str) -> String {
    format!("/Script/{module}.{name}")
}

/// Split a `/Script/<module>.<name>` path into its parts.
///
/// Type names never contain a dot, so the split is at the last one and
/// module names may be dotted.
pub fn parse_script_path(path: &str) -> Option<(&str, &str)> {
    let (module, name) = path.strip_prefix("/Script/")?.rsplit_once('.')?;
    if module.is_empty() || name.is_empty() {
        return None;
    }
    Some((module, name))
}

/// Registry of type definitions keyed by (module, name)
#[derive(Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<(String, String), TypeHandle>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. Re-registering the same (module, name) replaces it.
    pub fn register(&self, kind: TypeKind, module: &str, name: &str) -> TypeHandle {
        let handle = TypeHandle {
            kind,
            module: module.to_string(),
            name: name.to_string(),
        };
        self.types
            .write()
            .insert((module.to_string(), name.to_string()), handle.clone());
        handle
    }

    pub fn register_struct(&self, module: &str, name: &str) -> TypeHandle {
        self.register(TypeKind::Struct, module, name)
    }

    pub fn register_class(&self, module: &str, name: &str) -> TypeHandle {
        self.register(TypeKind::Class, module, name)
    }

    pub fn find(&self, module: &str, name: &str) -> Option<TypeHandle> {
        self.types
            .read()
            .get(&(module.to_string(), name.to_string()))
            .cloned()
    }

    pub fn find_by_script_path(&self, path: &str) -> Option<TypeHandle> {
        let (module, name) = parse_script_path(path)?;
        self.find(module, name)
    }

    /// Load a struct definition (not an instance) by module and name.
    pub fn load_struct_definition(&self, module: &str, struct_name: &str) -> Option<TypeHandle> {
        self.load_definition(TypeKind::Struct, module, struct_name)
    }

    /// Load a class definition (not an instance) by module and name.
    pub fn load_class_definition(&self, module: &str, class_name: &str) -> Option<TypeHandle> {
        self.load_definition(TypeKind::Class, module, class_name)
    }

    fn load_definition(&self, kind: TypeKind, module: &str, name: &str) -> Option<TypeHandle> {
        let found = self
            .find_by_script_path(&script_path(module, name))
            .filter(|handle| handle.kind == kind);

        match &found {
            Some(_) => tracing::info!(
                "Successfully loaded {} definition: {} from module: {}",
                kind,
                name,
                module
            ),
            None => tracing::error!(
                "Failed to load {} definition: {} from module: {}",
                kind,
                name,
                module
            ),
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tracing_test::traced_test;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register_struct("MyGame", "FItemRow");
        registry.register_class("MyGame", "AEnemy");
        registry
    }

    #[test]
    fn test_script_path() {
        assert_eq!(script_path("MyGame", "FItemRow"), "/Script/MyGame.FItemRow");
        assert_eq!(parse_script_path("/Script/MyGame.FItemRow"), Some(("MyGame", "FItemRow")));
        assert_eq!(parse_script_path("/Game/MyGame.FItemRow"), None);
        assert_eq!(parse_script_path("/Script/.FItemRow"), None);
    }

    #[test]
    #[traced_test]
    fn test_load_struct_definition() {
        let registry = registry();
        let handle = registry.load_struct_definition("MyGame", "FItemRow").unwrap();
        assert_eq!(handle.kind, TypeKind::Struct);
        assert_eq!(handle.script_path(), "/Script/MyGame.FItemRow");
        assert!(logs_contain("Successfully loaded struct definition: FItemRow"));
    }

    #[test]
    #[traced_test]
    fn test_kind_mismatch_is_a_miss() {
        let registry = registry();
        assert!(registry.load_struct_definition("MyGame", "AEnemy").is_none());
        assert!(registry.load_class_definition("MyGame", "AEnemy").is_some());
        assert!(logs_contain("Failed to load struct definition: AEnemy from module: MyGame"));
    }

    #[test]
    fn test_dotted_module_name() {
        let registry = TypeRegistry::new();
        registry.register_class("My.Game", "AEnemy");

        assert_eq!(
            parse_script_path("/Script/My.Game.AEnemy"),
            Some(("My.Game", "AEnemy"))
        );
        let handle = registry.load_class_definition("My.Game", "AEnemy").unwrap();
        assert_eq!(handle.module, "My.Game");
        assert_eq!(
            registry.find_by_script_path("/Script/My.Game.AEnemy"),
            Some(handle)
        );
    }

    #[test]
    fn test_unknown_module_is_a_miss() {
        assert!(registry().load_class_definition("Other", "AEnemy").is_none());
    }

    #[test]
    fn test_type_kind_strings() {
        assert_eq!(TypeKind::Class.to_string(), "class");
        assert_eq!(TypeKind::from_str("struct").unwrap(), TypeKind::Struct);
    }
}
