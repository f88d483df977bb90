use anyhow::Result;
use std::path::{Path, PathBuf};

/// Base directory override, e.g. a mounted volume when running in a container
pub fn base_path_override() -> Option<PathBuf> {
    std::env::var("DIARYSYNC_HOME")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

pub struct PathManager {
    config_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("diarysync");

        Ok(Self::with_base(base_dir))
    }

    /// Config files at the base level, logs in a subdirectory
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            log_dir: base.join("logs"),
            config_dir: base,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn token_file(&self) -> PathBuf {
        self.config_dir.join("trakt_token.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("diarysync.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        if let Some(base) = base_path_override() {
            return Self::with_base(base);
        }

        // Platform config dir (e.g. ~/.config/diarysync on Linux), else the working directory
        Self::new().unwrap_or_else(|_| Self::with_base(PathBuf::from(".")))
    }
}
