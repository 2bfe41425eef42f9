//! Configuration management for assetfs
//!
//! An overlay is described by its root directories, nested namespaces and
//! default lookup flags. Files may be JSON or YAML, picked by extension.

use crate::error::{Error, Result};
use crate::fs::{AssetFileSystem, NodeId, WalkMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding extra roots (OS path-list syntax)
pub const ENV_PATHS: &str = "ASSETFS_PATHS";

/// Environment variable selecting last-registered-wins order
pub const ENV_REVERSE: &str = "ASSETFS_REVERSE";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Physical roots of the overlay root node, highest precedence first
    pub roots: Vec<PathBuf>,

    /// Namespaces mounted below the root node
    pub namespaces: BTreeMap<String, NamespaceConfig>,

    /// Default lookup behaviour
    pub lookup: LookupConfig,
}

/// A namespace and its own nested namespaces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    pub roots: Vec<PathBuf>,
    pub namespaces: BTreeMap<String, NamespaceConfig>,
}

/// Lookup flags applied by the CLI and `Config::walk_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Probe roots last-registered first
    pub reverse: bool,
    /// Descend into namespaces
    pub namespaces: bool,
    /// Fall back to parent nodes
    pub parent: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        LookupConfig {
            reverse: false,
            namespaces: true,
            parent: true,
        }
    }
}

/// On-disk format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml`/`.yml` are YAML, everything else JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/assetfs/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("assetfs")
            .join("config.json")
    }

    /// Load configuration from a file, with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config = Self::parse(&content, ConfigFormat::from_path(path))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration text without touching the environment
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {}", e))),
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {}", e))),
        }
    }

    /// Serialize in the given format
    pub fn render(&self, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e))),
            ConfigFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e))),
        }
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.render(ConfigFormat::from_path(path))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file {:?}: {}", path, e))
        })?;
        Ok(())
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Some(paths) = std::env::var_os(ENV_PATHS) {
            let extra: Vec<PathBuf> = std::env::split_paths(&paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            self.prepend_roots(extra);
        }

        if let Ok(reverse) = std::env::var(ENV_REVERSE) {
            match reverse.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.lookup.reverse = true,
                "0" | "false" | "no" | "off" => self.lookup.reverse = false,
                other => debug!("ignoring {}={:?}", ENV_REVERSE, other),
            }
        }
    }

    /// Put `extra` in front of the configured roots, keeping the first
    /// occurrence of every path
    pub fn prepend_roots(&mut self, extra: Vec<PathBuf>) {
        let mut roots: Vec<PathBuf> = Vec::with_capacity(extra.len() + self.roots.len());
        for root in extra.into_iter().chain(self.roots.drain(..)) {
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        self.roots = roots;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        check_roots("<root>", &self.roots)?;
        check_namespaces("", &self.namespaces)
    }

    /// Walk mode matching the configured lookup flags
    pub fn walk_mode(&self) -> WalkMode {
        WalkMode::all()
            .with_reverse(self.lookup.reverse)
            .with_namespaces(self.lookup.namespaces)
            .with_parent(self.lookup.parent)
    }

    /// Build the overlay described by this configuration
    pub fn build(&self) -> Result<AssetFileSystem> {
        self.validate()?;
        let mut fs = AssetFileSystem::new();
        let root = fs.root();
        for path in &self.roots {
            fs.register_path(root, path)?;
        }
        build_namespaces(&mut fs, root, &self.namespaces)?;
        Ok(fs)
    }
}

fn build_namespaces(
    fs: &mut AssetFileSystem,
    parent: NodeId,
    namespaces: &BTreeMap<String, NamespaceConfig>,
) -> Result<()> {
    for (name, ns) in namespaces {
        let id = fs.namespace(parent, name)?;
        for path in &ns.roots {
            fs.register_path(id, path)?;
        }
        build_namespaces(fs, id, &ns.namespaces)?;
    }
    Ok(())
}

fn check_roots(owner: &str, roots: &[PathBuf]) -> Result<()> {
    for (i, root) in roots.iter().enumerate() {
        if root.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(format!("{}: empty root path", owner)));
        }
        if roots[..i].contains(root) {
            return Err(Error::InvalidConfig(format!(
                "{}: root {:?} listed twice",
                owner, root
            )));
        }
    }
    Ok(())
}

fn check_namespaces(prefix: &str, namespaces: &BTreeMap<String, NamespaceConfig>) -> Result<()> {
    for (name, ns) in namespaces {
        let full = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "invalid namespace name {:?}",
                full
            )));
        }
        check_roots(&full, &ns.roots)?;
        check_namespaces(&full, &ns.namespaces)?;
    }
    Ok(())
}
