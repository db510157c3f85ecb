use std::path::PathBuf;
use std::sync::OnceLock;
use directories::BaseDirs;

const APP_DIR: &str = "scopeshell";

static DATA_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

pub struct PathManager;

impl PathManager {
    /// Set a custom data directory. Only the first call takes effect.
    pub fn set_data_dir(path: PathBuf) {
        let _ = DATA_DIR_OVERRIDE.set(path);
    }

    pub fn data_dir() -> Option<PathBuf> {
        if let Some(d) = DATA_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        BaseDirs::new().map(|d| d.data_dir().join(APP_DIR))
    }

    pub fn config_dir() -> Option<PathBuf> {
        // An overridden data dir holds the configuration as well
        if DATA_DIR_OVERRIDE.get().is_some() {
            return Self::data_dir();
        }
        BaseDirs::new().map(|d| d.config_dir().join(APP_DIR))
    }

    /// Line-editor history shared by every console run
    pub fn history_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("history.txt"))
    }

    /// TOML file backing the `env`/`get`/`set` store
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.toml"))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("logs"))
    }

    pub fn ensure_dirs_exist() -> std::io::Result<()> {
        for dir in [Self::data_dir(), Self::config_dir(), Self::logs_dir()].into_iter().flatten() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
