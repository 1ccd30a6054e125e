//! Configuration for the core crate
//!
//! This module provides configuration options for the core crate,
//! including editor defaults, storage keys, binding policy and logging.

use std::path::PathBuf;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::{to_config_error, Result};
use crate::models::DEFAULT_FORM_NAME;

/// Defaults applied when authoring forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Name given to new forms
    pub default_form_name: String,

    /// Creator recorded on new forms
    pub default_creator_id: String,

    /// Whether new forms start active
    pub default_active: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            default_form_name: DEFAULT_FORM_NAME.to_string(),
            default_creator_id: "user-1".to_string(),
            default_active: true,
        }
    }
}

/// Persistence keys and location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Collection key for form definitions
    pub forms_key: String,

    /// Collection key for response records
    pub responses_key: String,

    /// Directory used by the JSON file store
    pub data_dir: PathBuf,

    /// Whether the file store writes indented JSON
    pub pretty_json: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            forms_key: "FORMS".to_string(),
            responses_key: "FORM_RESPONSES".to_string(),
            data_dir: PathBuf::from("data"),
            pretty_json: true,
        }
    }
}

/// Response binding policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Leave unanswered fields out of saved records
    pub drop_unanswered: bool,

    /// Refuse to save a response with any invalid answer.
    /// When false, invalid answers are dropped and reported.
    pub strict: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        BindingConfig {
            drop_unanswered: true,
            strict: true,
        }
    }
}

/// Core configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Editor defaults
    pub editor: EditorConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Binding policy
    pub binding: BindingConfig,

    /// Log level
    pub log_level: String,

    /// Whether to enable debug mode
    pub debug_mode: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            editor: EditorConfig::default(),
            storage: StorageConfig::default(),
            binding: BindingConfig::default(),
            log_level: "info".to_string(),
            debug_mode: false,
        }
    }
}

impl CoreConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Create a development configuration
    pub fn development() -> Self {
        let mut config = Self::default();
        config.debug_mode = true;
        config.log_level = "debug".to_string();
        config
    }

    /// Create a production configuration
    pub fn production() -> Self {
        let mut config = Self::default();
        config.debug_mode = false;
        config.log_level = "info".to_string();
        config.storage.pretty_json = false;
        config
    }

    /// Create a testing configuration
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.debug_mode = true;
        config.log_level = "debug".to_string();
        config.storage.data_dir = std::env::temp_dir().join("formkit-test");
        config
    }

    /// Parsed log level
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level.parse::<LevelFilter>().map_err(to_config_error)
    }

    /// Install an env_logger at the configured level.
    ///
    /// `RUST_LOG` still takes precedence. Calling this more than once is
    /// harmless.
    pub fn init_logging(&self) -> Result<()> {
        let level = self.level_filter()?;
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .try_init();
        Ok(())
    }
}
