//! Editor package utilities
//!
//! Helpers shared by the editor tooling:
//! - [`paths`]: filesystem path <-> package path translation
//! - [`plugin`]: plugin content root and project file discovery
//! - [`asset_registry`]: asset registry capability and membership checks
//! - [`type_registry`]: name-based type definition lookup
//! - [`package`]: saving assets into packages

pub mod asset_registry;
pub mod directory;
pub mod error;
pub mod meta;
pub mod package;
pub mod paths;
pub mod plugin;
pub mod type_registry;

pub use error::{PackageError, Result};
