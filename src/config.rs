use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BuildToolError, Result};

const CANDIDATES: [&str; 4] = ["ccbuild.toml", "ccbuild.json", "ccbuild.yaml", "ccbuild.yml"];

/// Configuration file structure for ccbuild.
///
/// Every value is optional; command-line flags and environment variables
/// take precedence over anything set here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Build API base URL
    pub base_url: Option<String>,

    /// Commerce Cloud project (subscription) id
    pub project_id: Option<String>,

    /// Environment code, e.g. "d1"
    pub environment_id: Option<String>,

    /// Personal access token
    pub token: Option<String>,

    /// Number of builds fetched by `list`
    pub list_limit: Option<i64>,

    /// Number of builds inspected by `prune`
    pub prune_limit: Option<i64>,
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./ccbuild.toml
    /// 3. ./ccbuild.json
    /// 4. ./ccbuild.yaml
    /// 5. ./ccbuild.yml
    /// 6. `<config dir>/ccbuild/config.toml`
    ///
    /// Returns default configuration if no file is found.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the specified path does not exist or
    /// any file found cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(BuildToolError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_path(path);
        }

        match Self::discover(Path::new("."), dirs::config_dir().as_deref()) {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    fn discover(dir: &Path, user_config_dir: Option<&Path>) -> Option<PathBuf> {
        CANDIDATES
            .iter()
            .map(|candidate| dir.join(candidate))
            .chain(user_config_dir.map(|d| d.join("ccbuild").join("config.toml")))
            .find(|path| path.is_file())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        log::debug!("Loading configuration from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|e| {
            BuildToolError::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        let parsed = match extension {
            "toml" => toml::from_str(&contents).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .map_err(|e| e.to_string()),
        };

        parsed.map_err(|e| {
            BuildToolError::config(format!("Failed to parse config file {}: {e}", path.display()))
        })
    }
}
