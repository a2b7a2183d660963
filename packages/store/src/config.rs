//! Store connection settings.
//!
//! Loaded from the environment ([`StoreConfig::from_env`]) or a TOML file
//! ([`StoreConfig::load`]). The resulting value is handed to
//! [`crate::DocumentStore::new`]; nothing is held in process-wide state.

use std::path::Path;

use serde::Deserialize;

use crate::StoreError;

/// Default number of documents requested per collection read.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the document database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// API base URL (e.g., `"https://cloud.appwrite.io/v1"`).
    pub endpoint: String,
    /// Project identifier sent with every request.
    pub project_id: String,
    /// Server API key. Omitted for collections readable by guests.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Database holding both collections.
    pub database_id: String,
    /// Collection of areas with population.
    pub areas_collection_id: String,
    /// Collection of incident records.
    pub incidents_collection_id: String,
    /// Maximum documents fetched per collection. Larger collections are
    /// truncated.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl StoreConfig {
    /// Reads the config from `APPWRITE_*` environment variables.
    ///
    /// Required: `APPWRITE_ENDPOINT`, `APPWRITE_PROJECT_ID`,
    /// `APPWRITE_DATABASE_ID`, `APPWRITE_AREAS_COLLECTION_ID`,
    /// `APPWRITE_INCIDENTS_COLLECTION_ID`. Optional: `APPWRITE_API_KEY`,
    /// `APPWRITE_PAGE_LIMIT`, `APPWRITE_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if a required variable is unset or a
    /// numeric one does not parse.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup using the same keys
    /// as [`Self::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if a required key is missing or a
    /// numeric one does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| StoreError::Config {
                    message: format!("{key} environment variable not set"),
                })
        };

        let page_limit = match lookup("APPWRITE_PAGE_LIMIT") {
            Some(v) => parse_number(&v, "APPWRITE_PAGE_LIMIT")?,
            None => DEFAULT_PAGE_LIMIT,
        };
        let timeout_secs = match lookup("APPWRITE_TIMEOUT_SECS") {
            Some(v) => parse_number(&v, "APPWRITE_TIMEOUT_SECS")?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            endpoint: required("APPWRITE_ENDPOINT")?,
            project_id: required("APPWRITE_PROJECT_ID")?,
            api_key: lookup("APPWRITE_API_KEY").filter(|v| !v.trim().is_empty()),
            database_id: required("APPWRITE_DATABASE_ID")?,
            areas_collection_id: required("APPWRITE_AREAS_COLLECTION_ID")?,
            incidents_collection_id: required("APPWRITE_INCIDENTS_COLLECTION_ID")?,
            page_limit,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses the config from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Toml`] if the document is malformed, or
    /// [`StoreError::Config`] if a value is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, StoreError> {
        let config: Self = toml::de::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        log::debug!("Loading store config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.page_limit == 0 {
            return Err(StoreError::Config {
                message: "page_limit must be at least 1".to_string(),
            });
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(StoreError::Config {
                message: format!("endpoint must be an http(s) URL, got '{}'", self.endpoint),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| StoreError::Config {
        message: format!("{key}='{value}' is not a valid number: {e}"),
    })
}
