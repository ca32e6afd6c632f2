//! Configuration management.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `LIT_REVIEW_*` environment variables (nested keys joined with `__`,
//! e.g. `LIT_REVIEW_ZOTERO__DEFAULT_COLLECTION`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [zotero]
//! api_base = "https://api.zotero.org"
//! web_base = "https://www.zotero.org"
//! library_slug = "prestonraab"
//! default_collection = "BookChapter"
//!
//! [sources]
//! crossref_base = "https://api.crossref.org"
//! pubmed_base = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils"
//! mailto = "me@example.org"
//!
//! [paths]
//! knowledge_base = "01_Knowledge_Base"
//! extracted_text_dir = "literature/ExtractedText"
//! zotero_storage = "/home/me/Zotero/storage"
//!
//! [http]
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Zotero credentials never live in the file; they come from
//! `ZOTERO_API_KEY` and `ZOTERO_USER_ID` (a `.env` file is honoured).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::{CROSSREF_API_BASE, PUBMED_EUTILS_BASE};

/// Environment variable holding the Zotero API key
pub const API_KEY_VAR: &str = "ZOTERO_API_KEY";

/// Environment variable holding the numeric Zotero user ID
pub const USER_ID_VAR: &str = "ZOTERO_USER_ID";

/// Name of the config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "lit-review.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub zotero: ZoteroConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Zotero endpoints and defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoteroConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Base of the web library, used for "view at" links
    #[serde(default = "default_web_base")]
    pub web_base: String,

    /// Web library path segment (usually the username); `users/{id}` when unset
    #[serde(default)]
    pub library_slug: Option<String>,

    #[serde(default = "default_collection")]
    pub default_collection: String,
}

impl Default for ZoteroConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            web_base: default_web_base(),
            library_slug: None,
            default_collection: default_collection(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.zotero.org".to_string()
}

fn default_web_base() -> String {
    "https://www.zotero.org".to_string()
}

fn default_collection() -> String {
    "BookChapter".to_string()
}

/// Metadata source endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_crossref_base")]
    pub crossref_base: String,

    #[serde(default = "default_pubmed_base")]
    pub pubmed_base: String,

    /// Contact address for CrossRef's polite pool
    #[serde(default)]
    pub mailto: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            crossref_base: default_crossref_base(),
            pubmed_base: default_pubmed_base(),
            mailto: None,
        }
    }
}

fn default_crossref_base() -> String {
    CROSSREF_API_BASE.to_string()
}

fn default_pubmed_base() -> String {
    PUBMED_EUTILS_BASE.to_string()
}

/// Knowledge-base file locations, relative to the working directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_knowledge_base")]
    pub knowledge_base: PathBuf,

    #[serde(default = "default_extracted_text_dir")]
    pub extracted_text_dir: PathBuf,

    /// Zotero's local attachment store
    #[serde(default = "default_zotero_storage")]
    pub zotero_storage: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            knowledge_base: default_knowledge_base(),
            extracted_text_dir: default_extracted_text_dir(),
            zotero_storage: default_zotero_storage(),
        }
    }
}

impl PathsConfig {
    pub fn claims_file(&self) -> PathBuf {
        self.knowledge_base.join("claims_and_evidence.md")
    }

    pub fn claims_dir(&self) -> PathBuf {
        self.knowledge_base.join("claims")
    }

    pub fn claims_matrix(&self) -> PathBuf {
        self.knowledge_base.join("claims_matrix.md")
    }
}

fn default_knowledge_base() -> PathBuf {
    PathBuf::from("01_Knowledge_Base")
}

fn default_extracted_text_dir() -> PathBuf {
    PathBuf::from("literature/ExtractedText")
}

fn default_zotero_storage() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join("Zotero")
        .join("storage")
}

/// HTTP settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Serialize to TOML, e.g. for writing a starter config file
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Check that every endpoint is an absolute http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoints = [
            ("zotero.api_base", &self.zotero.api_base),
            ("zotero.web_base", &self.zotero.web_base),
            ("sources.crossref_base", &self.sources.crossref_base),
            ("sources.pubmed_base", &self.sources.pubmed_base),
        ];

        for (key, value) in endpoints {
            let parsed = url::Url::parse(value)
                .map_err(|e| ConfigError::InvalidUrl(key.to_string(), e.to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl(
                    key.to_string(),
                    format!("unsupported scheme '{}'", parsed.scheme()),
                ));
            }
        }
        Ok(())
    }

    /// Link to an item in the web library
    pub fn item_url(&self, credentials: &ZoteroCredentials, item_key: &str) -> String {
        let slug = self
            .zotero
            .library_slug
            .clone()
            .unwrap_or_else(|| format!("users/{}", credentials.user_id));
        format!(
            "{}/{}/items/{}",
            self.zotero.web_base.trim_end_matches('/'),
            slug,
            item_key
        )
    }
}

/// Load configuration from an optional file plus `LIT_REVIEW_*` environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::Io(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("LIT_REVIEW")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    let config: Config = settings
        .try_deserialize()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Find a config file: `./lit-review.toml`, then `<config dir>/lit-review/config.toml`
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("lit-review").join("config.toml"))
        .filter(|p| p.is_file())
}

/// Zotero credentials taken from the environment
#[derive(Clone, PartialEq, Eq)]
pub struct ZoteroCredentials {
    pub api_key: String,
    pub user_id: String,
}

impl std::fmt::Debug for ZoteroCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoteroCredentials")
            .field("api_key", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl ZoteroCredentials {
    pub fn new(api_key: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            user_id: user_id.into(),
        }
    }

    /// Read `ZOTERO_API_KEY` and `ZOTERO_USER_ID` from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        match (get(API_KEY_VAR), get(USER_ID_VAR)) {
            (Some(api_key), Some(user_id)) => Ok(Self { api_key, user_id }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// Remediation text printed when credentials are missing
pub fn credentials_help() -> String {
    format!(
        "Error: {key} and {user} must be set in environment variables or .env file\n\
         Create a .env file with:\n  {key}=your_api_key_here\n  {user}=your_user_id_here",
        key = API_KEY_VAR,
        user = USER_ID_VAR
    )
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ZOTERO_API_KEY and ZOTERO_USER_ID must be set")]
    MissingCredentials,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
