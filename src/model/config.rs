use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub paths: PathsConfig,
    pub theme: ThemeConfig,
    pub surface: SurfaceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Extension started when the selection file names none.
    pub extension_id: String,
    pub poll_interval_ms: u64,
    pub tick_ms: u64,
    #[serde(default = "default_true")]
    pub clipboard: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub plugins_dir: String,
    pub selection_file: String,
    #[serde(default)]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeConfig {
    pub background: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceConfig {
    pub load_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

const DEFAULTS: &str = include_str!("../../config/default.toml");

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let mut config = Self::defaults()?;

        if let Some(config_path) = user_config_path()
            && config_path.exists()
        {
            let user_str = fs::read_to_string(&config_path)?;
            config = Self::parse(&user_str)?;
        }

        Ok(config)
    }

    pub fn defaults() -> Result<Self> {
        Self::parse(DEFAULTS)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        expand_tilde(Path::new(&self.paths.plugins_dir))
    }

    pub fn selection_file(&self) -> PathBuf {
        expand_tilde(Path::new(&self.paths.selection_file))
    }

    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = self.paths.data_dir.as_ref() {
            return expand_tilde(Path::new(dir));
        }

        directories::ProjectDirs::from("", "", "agentpanel")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("agentpanel"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.general.poll_interval_ms.max(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.general.tick_ms.max(10))
    }

    pub fn surface_load_delay(&self) -> Duration {
        Duration::from_millis(self.surface.load_delay_ms)
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "agentpanel")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if !text.starts_with('~') {
        return path.to_path_buf();
    }

    if let Some(base_dirs) = directories::BaseDirs::new() {
        let home = base_dirs.home_dir().to_string_lossy();
        return PathBuf::from(text.replacen('~', &home, 1));
    }

    path.to_path_buf()
}
