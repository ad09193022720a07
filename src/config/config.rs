use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults read from `config.toml`; command line flags take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the Porter script
    #[serde(default)]
    pub porter: Option<PathBuf>,

    /// Path to the AUCpreD launcher
    #[serde(default)]
    pub aucpred: Option<PathBuf>,

    /// Interpreter used to start Porter
    #[serde(default = "default_python")]
    pub python: String,

    /// Per-invocation predictor deadline, 0 disables it
    #[serde(default)]
    pub timeout_secs: u64,

    #[serde(default = "default_parallel")]
    pub parallel: usize,
}

fn default_python() -> String {
    "python".to_string()
}

fn default_parallel() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            porter: None,
            aucpred: None,
            python: default_python(),
            timeout_secs: 0,
            parallel: default_parallel(),
        }
    }
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "structure-annotator", "structure-annotator")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                if let Ok(config) = toml::from_str(&content) {
                    return config;
                }
            }
        }
        Config::default()
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine config directory"))?;
        self.save_to(&path)?;
        Ok(path)
    }
}
