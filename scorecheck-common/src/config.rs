//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a per-module TOML file. Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. `SCORECHECK_ROOT_FOLDER`, then `SCORECHECK_ROOT`
//! 3. TOML config file `root_folder`
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable config file never terminates the process; it is
//! logged and the compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable for the root folder (preferred)
pub const ENV_ROOT_FOLDER: &str = "SCORECHECK_ROOT_FOLDER";
/// Alternative environment variable for the root folder
pub const ENV_ROOT: &str = "SCORECHECK_ROOT";
/// Environment variable holding the vision model API key
pub const ENV_VISION_API_KEY: &str = "SCORECHECK_VISION_API_KEY";

const DATABASE_FILE_NAME: &str = "scorecheck.db";

/// Compiled-in fallback values for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/scorecheck (or /var/lib/scorecheck for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("scorecheck"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/scorecheck"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("scorecheck"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/scorecheck"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("scorecheck"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\scorecheck"))
    } else {
        PathBuf::from("./scorecheck_data")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_authority_timeout_ms() -> u64 {
    10_000
}

fn default_tiebreak_timeout_ms() -> u64 {
    3_000
}

fn default_extractor_timeout_ms() -> u64 {
    120_000
}

fn default_extractor_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_extractor_model() -> String {
    "openai/gpt-4.1-mini".to_string()
}

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional in the file; absent sections fall back to
/// built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and uploaded images
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory scanned for `{game_id}_rank_{n}` images (default `<root>/images`)
    #[serde(default)]
    pub images_dir: Option<PathBuf>,

    /// Authoritative scoring API
    #[serde(default)]
    pub authority: AuthorityConfig,

    /// Tie-break store access
    #[serde(default)]
    pub tiebreak: TiebreakConfig,

    /// Vision model endpoint
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Authority source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// Endpoint returning the official match ranking list
    #[serde(default)]
    pub url: Option<String>,

    /// Hard deadline for the single authority fetch
    #[serde(default = "default_authority_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_authority_timeout_ms(),
        }
    }
}

impl AuthorityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Tie-break store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiebreakConfig {
    /// Per-team lookup deadline; expiry degrades to zeroed stats
    #[serde(default = "default_tiebreak_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TiebreakConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_tiebreak_timeout_ms(),
        }
    }
}

impl TiebreakConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Vision model endpoint settings (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_extractor_base_url")]
    pub base_url: String,

    #[serde(default = "default_extractor_model")]
    pub model: String,

    /// API key; `SCORECHECK_VISION_API_KEY` takes priority
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_extractor_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: default_extractor_base_url(),
            model: default_extractor_model(),
            api_key: None,
            timeout_ms: default_extractor_timeout_ms(),
        }
    }
}

impl ExtractorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Resolve the vision API key
///
/// **Priority:** ENV → TOML
pub fn resolve_vision_api_key(config: &TomlConfig) -> Result<String> {
    if let Ok(key) = std::env::var(ENV_VISION_API_KEY) {
        if is_valid_key(&key) {
            return Ok(key);
        }
    }

    if let Some(key) = config.extractor.api_key.as_ref() {
        if is_valid_key(key) {
            return Ok(key.clone());
        }
    }

    Err(Error::Config(format!(
        "Vision API key not configured. Set {} or [extractor] api_key in the TOML config",
        ENV_VISION_API_KEY
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Per-module TOML config file path: `<config_dir>/scorecheck/<module>.toml`
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scorecheck").join(format!("{}.toml", module_name)))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load the module's TOML config, falling back to defaults
///
/// An explicit path must exist and parse; the implicit per-module path may
/// be absent.
pub fn load_module_config(module_name: &str, explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return load_toml_config(path);
    }

    let Some(path) = config_file_path(module_name) else {
        debug!("No config directory on this platform, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        debug!("Config file not found at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    match load_toml_config(&path) {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!("{} - continuing with defaults", e);
            Ok(TomlConfig::default())
        }
    }
}

/// Resolves the root folder for a module
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
    config_loaded: bool,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
            config_loaded: false,
        }
    }

    /// Command-line override (highest priority)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Use the caller's already-loaded config instead of reading the
    /// per-module file again
    pub fn with_config(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self.config_loaded = true;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        // Priority 2: Environment variables
        for var in [ENV_ROOT_FOLDER, ENV_ROOT] {
            if let Ok(path) = std::env::var(var) {
                if !path.trim().is_empty() {
                    return PathBuf::from(path);
                }
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            return path.clone();
        }
        if self.config_loaded {
            return CompiledDefaults::for_current_platform().root_folder;
        }
        if let Some(path) = config_file_path(&self.module_name).filter(|p| p.exists()) {
            if let Ok(config) = load_toml_config(&path) {
                if let Some(root) = config.root_folder {
                    return root;
                }
            }
        }

        // Priority 4: OS-dependent compiled default
        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder layout on demand
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder (and parents); safe to call repeatedly
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    /// Default images directory when the config does not name one
    pub fn images_dir(&self) -> PathBuf {
        self.root_folder.join("images")
    }
}
