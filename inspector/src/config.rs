//! Configuration loading
//!
//! Settings come from `.inspector.toml`, found by walking up from the current
//! directory and then falling back to `~/.config/bevy-inspector/`. Environment
//! variables override the file; CLI flags override both.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file name searched for in the directory tree
pub const CONFIG_FILE_NAME: &str = ".inspector.toml";

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. `start` and its parent directories (walking up to root)
/// 2. Global config at ~/.config/bevy-inspector/
fn find_config_file(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("bevy-inspector").join(filename);
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

/// Top-level inspector configuration (from .inspector.toml)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectorConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub hierarchy: WellKnownPaths,
    #[serde(default)]
    pub tree: TreeConfig,
}

/// Remote endpoint section
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request HTTP timeout; 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Component paths that drive hierarchy and display names
///
/// These moved between engine releases, so they are configurable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WellKnownPaths {
    #[serde(default = "default_parent_path")]
    pub parent: String,
    #[serde(default = "default_children_path")]
    pub children: String,
    #[serde(default = "default_name_path")]
    pub name: String,
}

/// Tree projection section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeConfig {
    /// Show a failed fetch as an error leaf instead of an empty child list
    #[serde(default)]
    pub show_errors: bool,
    /// Fetch every listed entity's component list right after listing
    #[serde(default)]
    pub prefetch_components: bool,
}

// Default value functions
fn default_url() -> String {
    "http://127.0.0.1".to_string()
}

fn default_port() -> u16 {
    15702
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_parent_path() -> String {
    "bevy_hierarchy::components::parent::Parent".to_string()
}

fn default_children_path() -> String {
    "bevy_hierarchy::components::children::Children".to_string()
}

fn default_name_path() -> String {
    "bevy_core::name::Name".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for WellKnownPaths {
    fn default() -> Self {
        Self {
            parent: default_parent_path(),
            children: default_children_path(),
            name: default_name_path(),
        }
    }
}

impl WellKnownPaths {
    /// All three paths, in the order sent as query options
    pub fn as_options(&self) -> [&str; 3] {
        [
            self.parent.as_str(),
            self.children.as_str(),
            self.name.as_str(),
        ]
    }
}

impl RemoteConfig {
    /// Endpoint URL with the port applied
    ///
    /// A port already present in `url` is replaced.
    pub fn endpoint(&self) -> Result<url::Url> {
        let mut endpoint = url::Url::parse(&self.url)?;
        endpoint
            .set_port(Some(self.port))
            .map_err(|_| anyhow::anyhow!("cannot set a port on {}", self.url))?;
        Ok(endpoint)
    }
}

impl InspectorConfig {
    /// Load config from .inspector.toml
    ///
    /// Search order:
    /// 1. Walk up directory tree from cwd looking for .inspector.toml
    /// 2. Check ~/.config/bevy-inspector/.inspector.toml (global fallback)
    /// 3. Fall back to defaults
    ///
    /// Environment overrides are applied last.
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let mut config = Self::discover(&cwd)?;
        config.apply_env();
        Ok(config)
    }

    /// Load the first config file found from `start` upwards, or defaults
    pub fn discover(start: &Path) -> Result<Self> {
        if let Some(config_path) = find_config_file(start, CONFIG_FILE_NAME) {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE_NAME);
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: InspectorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `BEVY_REMOTE_URL` / `BEVY_REMOTE_PORT`
    fn apply_env(&mut self) {
        self.apply_remote_overrides(
            std::env::var("BEVY_REMOTE_URL").ok(),
            std::env::var("BEVY_REMOTE_PORT").ok(),
        );
    }

    /// Override the remote address; an unparsable port is logged and ignored
    pub fn apply_remote_overrides(&mut self, url: Option<String>, port: Option<String>) {
        if let Some(url) = url {
            self.remote.url = url;
        }
        if let Some(port) = port {
            match port.trim().parse() {
                Ok(port) => self.remote.port = port,
                Err(_) => tracing::warn!("Ignoring invalid BEVY_REMOTE_PORT: {}", port),
            }
        }
    }
}
