//! Configuration management for Quill.
//!
//! Parses `quill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `notion.api_key`
//! - `notion.database_id`
//! - `notion.base_url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// Largest page size the Notion API accepts.
const MAX_PAGE_SIZE: u32 = 100;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Notion connection settings (optional section, see [`Config::require_notion`]).
    pub notion: Option<NotionConfig>,
    /// Database property names used to extract post metadata.
    pub properties: PropertyNames,
    /// Markdown rendering settings.
    pub render: RenderConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Notion API configuration.
#[derive(Debug, Deserialize)]
pub struct NotionConfig {
    /// Integration token.
    pub api_key: String,
    /// ID of the database holding blog posts.
    pub database_id: String,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the `Notion-Version` header.
    #[serde(default = "default_version")]
    pub version: String,
    /// Number of results requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Maximum number of pages fetched for a single parent before giving up.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.notion.com".to_owned()
}

fn default_version() -> String {
    "2022-06-28".to_owned()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

impl NotionConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.api_key, "notion.api_key")?;
        require_non_empty(&self.database_id, "notion.database_id")?;
        require_non_empty(&self.base_url, "notion.base_url")?;
        require_http_url(&self.base_url, "notion.base_url")?;
        require_non_empty(&self.version, "notion.version")?;

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Validation(format!(
                "notion.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Validation(
                "notion.max_pages must be greater than 0".to_owned(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "notion.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Names of the database properties holding post metadata.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PropertyNames {
    /// Title property (`title` type).
    pub title: String,
    /// Slug property (`rich_text` type).
    pub slug: String,
    /// Publication date property (`date` type).
    pub date: String,
    /// Tags property (`multi_select` type).
    pub tags: String,
    /// Excerpt property (`rich_text` type).
    pub excerpt: String,
    /// Cover image property (`url` or `files` type).
    pub image: String,
    /// Published flag property (`checkbox` type).
    pub published: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Title".to_owned(),
            slug: "Slug".to_owned(),
            date: "Date".to_owned(),
            tags: "Tags".to_owned(),
            excerpt: "Excerpt".to_owned(),
            image: "Image".to_owned(),
            published: "Published".to_owned(),
        }
    }
}

/// Markdown rendering configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pipeline mode.
    pub mode: RenderModeSetting,
}

/// Pipeline mode as written in the config file.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RenderModeSetting {
    /// Escape raw HTML, no line numbers.
    #[default]
    Strict,
    /// Pass raw HTML through and number code lines.
    Permissive,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`notion.api_key`").
        field: String,
        /// Error message (e.g., "${`NOTION_API_KEY`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quill.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }
        match Self::discover_config() {
            Some(discovered) => Self::load_from_file(&discovered),
            None => Ok(Self::default()),
        }
    }

    /// Get validated Notion configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_notion(&self) -> Result<&NotionConfig, ConfigError> {
        let notion = self.notion.as_ref().ok_or_else(|| {
            ConfigError::Validation("[notion] section required in config".into())
        })?;
        notion.validate()?;
        Ok(notion)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file. A missing `[notion]`
    /// section is not an error here; see [`Config::require_notion`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(notion) = &self.notion {
            notion.validate()?;
        }
        self.validate_properties()
    }

    fn validate_properties(&self) -> Result<(), ConfigError> {
        let names = &self.properties;
        require_non_empty(&names.title, "properties.title")?;
        require_non_empty(&names.slug, "properties.slug")?;
        require_non_empty(&names.date, "properties.date")?;
        require_non_empty(&names.tags, "properties.tags")?;
        require_non_empty(&names.excerpt, "properties.excerpt")?;
        require_non_empty(&names.image, "properties.image")?;
        require_non_empty(&names.published, "properties.published")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref mut notion) = self.notion {
            notion.api_key = expand::expand_env(&notion.api_key, "notion.api_key")?;
            notion.database_id = expand::expand_env(&notion.database_id, "notion.database_id")?;
            notion.base_url = expand::expand_env(&notion.base_url, "notion.base_url")?;
        }
        Ok(())
    }
}
