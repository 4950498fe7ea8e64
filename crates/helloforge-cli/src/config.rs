//! TOML configuration. Every field has a default; flags given on the command
//! line take precedence over file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::discovery::SourceKind;
use crate::monitor::{parse_interval, MIN_INTERVAL};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub templates: TemplatesConfig,
    pub test: TestConfig,
    pub monitor: MonitorConfig,
    pub discovery: DiscoveryConfig,
}

impl Config {
    /// Loads configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Loads the explicit path, or the default location when it exists.
    /// Anything unreadable falls back to defaults with a warning.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Self::default(),
            },
        };

        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {:#}, using defaults", e);
            Self::default()
        })
    }

    pub fn generate_default() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| "# Failed to generate config".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        if self.discovery.sources.is_empty() {
            anyhow::bail!("discovery.sources must name at least one source");
        }
        for name in &self.discovery.sources {
            name.parse::<SourceKind>()?;
        }
        if self.discovery.timeout_secs == 0 {
            anyhow::bail!("discovery.timeout_secs must be greater than 0");
        }
        let interval = parse_interval(&self.monitor.interval)?;
        if interval < MIN_INTERVAL {
            anyhow::bail!("monitor.interval must be at least 1m");
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/helloforge/config.toml`, falling back to `~/.config`.
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("helloforge/config.toml"))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Where generated templates are written
    pub dir: PathBuf,
    /// Host name placed in the server_name extension
    pub server_name: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./templates"),
            server_name: "www.google.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TestConfig {
    /// Echo server to test against when `--server` is not given
    pub server: Option<String>,
    /// Connect and reply timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            server: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Poll interval, e.g. `30m`, `1h`, `1h30m`
    pub interval: String,
    pub auto_generate: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: "1h".to_string(),
            auto_generate: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Sources tried in order; the first answer wins
    pub sources: Vec<String>,
    /// Platform key used by the omaha and versionhistory sources
    pub platform: String,
    pub timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                "omaha".to_string(),
                "releases".to_string(),
                "versionhistory".to_string(),
            ],
            platform: "win".to_string(),
            timeout_secs: 15,
        }
    }
}
