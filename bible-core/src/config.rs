//! Configuration for bible-vision

use crate::BibleError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional config file looked up at the project root
pub const CONFIG_FILE: &str = "bible.toml";

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# Bible Vision Configuration

[server]
# Address to bind; --port / BIBLE_PORT take precedence over `port`
bind = "127.0.0.1"
port = 3000

[paths]
# All paths are relative to the project root
data_dir = "data"
chapters_dir = "data/bible"
public_dir = "public"

[search]
# Hits returned when `limit` is absent or invalid
default_limit = 25
# Upper bound applied to any requested limit
max_limit = 500

[range]
# Characters of the first verse shown per chapter
preview_chars = 90

[discovery]
# Parent directories inspected when locating the project root
max_steps = 6
"#;

/// Bible Vision configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub range: RangeConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_chapters_dir")]
    pub chapters_dir: PathBuf,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

// Default value functions
fn default_bind() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_chapters_dir() -> PathBuf {
    PathBuf::from("data/bible")
}
fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}
fn default_limit() -> usize {
    25
}
fn default_max_limit() -> usize {
    500
}
fn default_preview_chars() -> usize {
    90
}
fn default_max_steps() -> usize {
    6
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chapters_dir: default_chapters_dir(),
            public_dir: default_public_dir(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load `bible.toml` from the project root, or defaults when absent
    pub fn load_from_root(root: &Path) -> crate::Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| BibleError::ConfigParse(e.to_string()))
    }

    pub fn chapters_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.chapters_dir)
    }

    pub fn public_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.public_dir)
    }
}

/// Walk upward from `start` until a directory holds both the data directory
/// and the chapter directory. Falls back to `start` after `max_steps` parents.
pub fn discover_project_root(start: &Path, paths: &PathsConfig, max_steps: usize) -> PathBuf {
    let mut current = Some(start);
    for _ in 0..=max_steps {
        let Some(dir) = current else {
            break;
        };
        if dir.join(&paths.data_dir).is_dir() && dir.join(&paths.chapters_dir).is_dir() {
            return dir.to_path_buf();
        }
        current = dir.parent();
    }
    start.to_path_buf()
}
