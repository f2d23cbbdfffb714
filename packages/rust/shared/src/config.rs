//! Application configuration for contentkit.
//!
//! User config lives at `~/.contentkit/contentkit.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContentKitError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contentkit.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contentkit";

// ---------------------------------------------------------------------------
// Config structs (matching contentkit.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Schema extraction settings.
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Content tree settings.
    #[serde(default)]
    pub tree: TreeConfig,
}

/// `[extractor]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// File extensions treated as schema modules during ingestion.
    #[serde(default = "default_module_extensions")]
    pub module_extensions: Vec<String>,

    /// Largest schema literal (in bytes) the evaluator will accept.
    #[serde(default = "default_max_literal_bytes")]
    pub max_literal_bytes: usize,

    /// Maximum object/array nesting inside a schema literal.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            module_extensions: default_module_extensions(),
            max_literal_bytes: default_max_literal_bytes(),
            max_nesting_depth: default_max_nesting_depth(),
        }
    }
}

fn default_module_extensions() -> Vec<String> {
    vec!["ts".into(), "js".into()]
}
fn default_max_literal_bytes() -> usize {
    1024 * 1024
}
fn default_max_nesting_depth() -> usize {
    128
}

/// `[tree]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Check structural preconditions before assembling a tree.
    #[serde(default = "default_true")]
    pub validate_input: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            validate_input: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Extractor options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime extraction limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorOptions {
    /// Largest accepted literal in bytes.
    pub max_literal_bytes: usize,
    /// Maximum literal nesting depth.
    pub max_nesting_depth: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ExtractorOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_literal_bytes: config.extractor.max_literal_bytes,
            max_nesting_depth: config.extractor.max_nesting_depth,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contentkit/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContentKitError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contentkit/contentkit.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentKitError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContentKitError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContentKitError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContentKitError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContentKitError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("module_extensions"));
        assert!(toml_str.contains("validate_input"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.extractor.max_nesting_depth, 128);
        assert_eq!(parsed.extractor.module_extensions, vec!["ts", "js"]);
        assert!(parsed.tree.validate_input);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[extractor]
module_extensions = ["mjs"]

[tree]
validate_input = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.extractor.module_extensions, vec!["mjs"]);
        assert_eq!(config.extractor.max_literal_bytes, 1024 * 1024);
        assert!(!config.tree.validate_input);
    }

    #[test]
    fn extractor_options_from_app_config() {
        let mut app = AppConfig::default();
        app.extractor.max_nesting_depth = 8;
        let opts = ExtractorOptions::from(&app);
        assert_eq!(opts.max_nesting_depth, 8);
        assert_eq!(opts.max_literal_bytes, 1024 * 1024);
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/contentkit.toml")).unwrap_err();
        assert!(matches!(err, ContentKitError::Io { .. }));
    }
}
