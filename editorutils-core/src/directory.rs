use std::path::PathBuf;

use directories::ProjectDirs;

use crate::meta::NAME;

pub struct Directory {}

impl Directory {
    #[cfg(not(feature = "portable"))]
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "neostack", NAME)
    }

    /// Return path adjacent to the executable
    #[cfg(feature = "portable")]
    fn project_dirs() -> Option<ProjectDirs> {
        let current_exe = std::env::current_exe().ok()?;
        ProjectDirs::from_path(current_exe.parent()?.join("editorutils-data"))
    }

    /// Get the path to the config directory, creating it when missing
    pub fn config_directory() -> Option<PathBuf> {
        let dir = Self::project_dirs()?.config_dir().to_path_buf();
        if !dir.exists() {
            let _ = std::fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    /// Get the path to the log directory, creating it when missing
    pub fn logs_directory() -> Option<PathBuf> {
        let dir = Self::project_dirs()?.data_local_dir().join("logs");
        if !dir.exists() {
            let _ = std::fs::create_dir_all(&dir);
        }
        Some(dir)
    }

    /// Default location of the user config file
    pub fn config_file() -> Option<PathBuf> {
        Self::config_directory().map(|dir| dir.join(format!("{NAME}.toml")))
    }
}
