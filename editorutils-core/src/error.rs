use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the path, package and asset helpers.
///
/// None of these are fatal: callers are expected to check the result and
/// decide what to do, the helpers only log a diagnostic line.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("{0} must not be empty")]
    InvalidInput(&'static str),

    #[error("invalid asset name: {0}")]
    InvalidAssetName(String),

    #[error("path is not inside any recognized content or plugin directory: {}", .0.display())]
    NotUnderContentRoot(PathBuf),

    #[error("invalid plugin package path: {0}")]
    InvalidPackagePath(String),

    #[error("package path does not start with a known root: {0}")]
    UnknownRoot(String),

    #[error("failed to create package: {0}")]
    CreateFailed(String),

    #[error("failed to save package to {}", .0.display())]
    SaveFailed(PathBuf),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, PackageError>;
