//! Layered configuration.
//!
//! Sources, later ones winning:
//! - built-in defaults
//! - `.symgraph/settings.toml`, discovered by walking ancestor directories
//! - environment variables prefixed with `SYMGRAPH_`, with double
//!   underscores separating nested levels:
//!   `SYMGRAPH_ENGINE__REQUEST_TIMEOUT_MS=5000` sets
//!   `engine.request_timeout_ms`, `SYMGRAPH_HIERARCHY__MAX_RESOLVE_DEPTH=2`
//!   sets `hierarchy.max_resolve_depth`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_DIR: &str = ".symgraph";
pub const CONFIG_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// How to reach the analysis engine
    #[serde(default)]
    pub engine: EngineConfig,

    /// Resolution limits
    #[serde(default)]
    pub hierarchy: HierarchyConfig,

    /// Logging levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    /// Command used to start the engine process
    #[serde(default = "default_engine_command")]
    pub command: String,

    /// Arguments passed to the engine command
    #[serde(default)]
    pub args: Vec<String>,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HierarchyConfig {
    /// Upper bound on the resolve depth of a single request
    #[serde(default = "default_max_resolve_depth")]
    pub max_resolve_depth: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level filter (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `hierarchy = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_engine_command() -> String {
    "analysis-engine".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_max_resolve_depth() -> u32 {
    crate::hierarchy::provider::DEFAULT_MAX_RESOLVE_DEPTH
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            engine: EngineConfig::default(),
            hierarchy: HierarchyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_engine_command(),
            args: Vec::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_resolve_depth: default_max_resolve_depth(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SYMGRAPH_").map(|key| {
                // Double underscore separates nesting levels; single
                // underscores stay inside field names.
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace settings file by walking ancestors for a
    /// `.symgraph` directory.
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }
        None
    }

    /// The directory holding `.symgraph`, if any ancestor has one.
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            if ancestor.join(CONFIG_DIR).is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }
        None
    }

    /// Save the configuration to a file, creating parent directories.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Write the default settings file into the current directory's
    /// `.symgraph`. Refuses to overwrite unless `force` is set.
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);
        if path.exists() && !force {
            return Err(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )
            .into());
        }
        Settings::default().save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.engine.command, "analysis-engine");
        assert_eq!(settings.engine.timeout(), Duration::from_secs(10));
        assert_eq!(settings.hierarchy.max_resolve_depth, 8);
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_settings_round_trip_through_toml() {
        let mut settings = Settings::default();
        settings.engine.command = "tsengine".to_string();
        settings.engine.args = vec!["--stdio".to_string()];
        settings
            .logging
            .modules
            .insert("hierarchy".to_string(), "debug".to_string());

        let toml_string = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.engine.command, "tsengine");
        assert_eq!(parsed.engine.args, ["--stdio"]);
        assert_eq!(
            parsed.logging.modules.get("hierarchy").map(String::as_str),
            Some("debug")
        );
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[engine]\ncommand = \"custom-engine\"\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.engine.command, "custom-engine");
        assert_eq!(settings.engine.request_timeout_ms, 10_000);
        assert_eq!(settings.hierarchy.max_resolve_depth, 8);
    }
}
