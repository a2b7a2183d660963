//! Local JSON snapshot of both collections.
//!
//! Each file holds either a bare array of documents or a list response
//! (`{ "total": n, "documents": [...] }`) saved from the store, in the
//! same wire format [`crate::DocumentStore`] reads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use barangay_risk::{FetchError, RiskDataSource};
use barangay_risk_models::{Area, Incident};
use serde::Deserialize;

use crate::StoreError;
use crate::documents::{AreaDocument, IncidentDocument, parse_document_list};

/// Reads areas and incidents from two JSON files.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    areas_path: PathBuf,
    incidents_path: PathBuf,
}

impl SnapshotSource {
    /// Creates a source over the given files. Nothing is read until a
    /// fetch.
    #[must_use]
    pub fn new(areas_path: impl Into<PathBuf>, incidents_path: impl Into<PathBuf>) -> Self {
        Self {
            areas_path: areas_path.into(),
            incidents_path: incidents_path.into(),
        }
    }

    /// Reads and converts the areas file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or parsed.
    pub async fn areas(&self) -> Result<Vec<Area>, StoreError> {
        let docs: Vec<AreaDocument> = read_documents(&self.areas_path).await?;
        Ok(docs.into_iter().map(Area::from).collect())
    }

    /// Reads and converts the incidents file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or parsed.
    pub async fn incidents(&self) -> Result<Vec<Incident>, StoreError> {
        let docs: Vec<IncidentDocument> = read_documents(&self.incidents_path).await?;
        Ok(docs.into_iter().map(Incident::from).collect())
    }
}

#[async_trait]
impl RiskDataSource for SnapshotSource {
    async fn fetch_areas(&self) -> Result<Vec<Area>, FetchError> {
        Ok(self.areas().await?)
    }

    async fn fetch_incidents(&self) -> Result<Vec<Incident>, FetchError> {
        Ok(self.incidents().await?)
    }
}

async fn read_documents<T>(path: &Path) -> Result<Vec<T>, StoreError>
where
    T: for<'de> Deserialize<'de>,
{
    log::debug!("Reading snapshot {}", path.display());
    let text = tokio::fs::read_to_string(path).await?;
    let body: serde_json::Value = serde_json::from_str(&text)?;
    let (documents, _) = parse_document_list(body)?;
    Ok(documents)
}
