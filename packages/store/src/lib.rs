#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Readers for the area and incident collections.
//!
//! [`DocumentStore`] talks to the hosted document database over its REST
//! API; [`SnapshotSource`] reads the same documents from local JSON files.
//! Both implement [`barangay_risk::RiskDataSource`] so the aggregator never
//! sees where the data came from.

pub mod client;
pub mod config;
pub mod documents;
pub mod snapshot;

pub use client::DocumentStore;
pub use config::StoreConfig;
pub use snapshot::SnapshotSource;

/// Errors that can occur while reading from the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error")]
    Json(#[from] serde_json::Error),

    /// I/O error (snapshot or config file read).
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// TOML config parsing failed.
    #[error("TOML parse error")]
    Toml(#[from] toml::de::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status code.
        status: u16,
        /// Server-provided message, if any.
        message: String,
    },

    /// The response body had an unexpected shape.
    #[error("Unexpected response: {message}")]
    Response {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}
