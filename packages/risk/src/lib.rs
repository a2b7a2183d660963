#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Barangay crime-rate aggregation and k-means risk tiering.
//!
//! [`compute_area_risk`] reads areas and incidents from a
//! [`RiskDataSource`], counts incidents per area by normalized name,
//! converts counts to incidents per 1,000 residents, clusters the rates
//! into three groups, and labels each group by centroid rank.
//!
//! Everything after the two fetches is the pure function [`score_areas`].

pub mod aggregate;
pub mod filter;
pub mod kmeans;

use async_trait::async_trait;
use barangay_risk_models::{Area, AreaRiskRecord, Incident, RiskLevel};

pub use aggregate::{count_incidents_by_area, crime_rate, filter_by_area, normalize_area_name};
pub use filter::IncidentFilter;
pub use kmeans::{ClusterError, KMeansResult, kmeans_1d, rank_labels};

/// Number of risk tiers. Fixed.
pub const RISK_CLUSTERS: usize = 3;

/// Iteration cap for the clustering pass.
pub const MAX_KMEANS_ITERATIONS: usize = 100;

/// Boxed error returned by [`RiskDataSource`] implementations.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// The two collections the aggregator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Collection {
    /// Areas with population.
    #[strum(serialize = "areas")]
    Areas,
    /// Incident records.
    #[strum(serialize = "incidents")]
    Incidents,
}

/// Errors that can occur while computing area risk.
#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    /// Reading one of the collections failed. Not retried.
    #[error("Failed to fetch {collection}")]
    Fetch {
        /// Which collection failed.
        collection: Collection,
        /// Underlying data-source error.
        #[source]
        source: FetchError,
    },
}

/// Read access to the area and incident collections.
///
/// Each call should return a complete snapshot of its collection.
#[async_trait]
pub trait RiskDataSource: Send + Sync {
    /// Fetches every area.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the read fails.
    async fn fetch_areas(&self) -> Result<Vec<Area>, FetchError>;

    /// Fetches every incident.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the read fails.
    async fn fetch_incidents(&self) -> Result<Vec<Incident>, FetchError>;
}

/// Fetches both collections concurrently and scores every area.
///
/// # Errors
///
/// Returns [`RiskError::Fetch`] if either read fails.
pub async fn compute_area_risk(
    source: &dyn RiskDataSource,
) -> Result<Vec<AreaRiskRecord>, RiskError> {
    compute_area_risk_filtered(source, &IncidentFilter::default()).await
}

/// Like [`compute_area_risk`], but only incidents passing `filter` are
/// counted.
///
/// # Errors
///
/// Returns [`RiskError::Fetch`] if either read fails.
pub async fn compute_area_risk_filtered(
    source: &dyn RiskDataSource,
    filter: &IncidentFilter,
) -> Result<Vec<AreaRiskRecord>, RiskError> {
    let areas = async {
        source.fetch_areas().await.map_err(|source| RiskError::Fetch {
            collection: Collection::Areas,
            source,
        })
    };
    let incidents = async {
        source
            .fetch_incidents()
            .await
            .map_err(|source| RiskError::Fetch {
                collection: Collection::Incidents,
                source,
            })
    };

    let (areas, incidents) = futures::future::try_join(areas, incidents).await?;

    log::debug!(
        "Fetched {} area(s) and {} incident(s)",
        areas.len(),
        incidents.len()
    );

    if filter.is_empty() {
        return Ok(score_areas(&areas, &incidents));
    }

    let kept: Vec<Incident> = incidents
        .into_iter()
        .filter(|i| filter.matches(i))
        .collect();
    log::debug!("{} incident(s) pass the filter", kept.len());

    Ok(score_areas(&areas, &kept))
}

/// Scores `areas` against `incidents`.
///
/// Returns one record per area, in input order. When the rates cannot be
/// split into three clusters every record is labeled
/// [`RiskLevel::Unknown`].
#[must_use]
pub fn score_areas(areas: &[Area], incidents: &[Incident]) -> Vec<AreaRiskRecord> {
    let counts = count_incidents_by_area(incidents);

    let mut records: Vec<AreaRiskRecord> = areas
        .iter()
        .map(|area| {
            let population = area.effective_population();
            let incident_count = counts
                .get(&normalize_area_name(&area.name))
                .copied()
                .unwrap_or(0);
            AreaRiskRecord {
                area_id: area.id.clone(),
                area_name: area.name.clone(),
                population,
                district: area.district.clone(),
                incident_count,
                rate: crime_rate(incident_count, population),
                risk_level: RiskLevel::Unknown,
            }
        })
        .collect();

    let rates: Vec<f64> = records.iter().map(|r| r.rate).collect();

    match kmeans_1d(&rates, RISK_CLUSTERS, MAX_KMEANS_ITERATIONS) {
        Ok(result) => {
            let labels = rank_labels(&result.centroids);
            for (record, cluster) in records.iter_mut().zip(&result.assignments) {
                record.risk_level = labels[*cluster];
            }
        }
        Err(e) => {
            log::warn!(
                "Skipping risk clustering for {} area(s): {e}",
                records.len()
            );
        }
    }

    records
}
