#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Area, incident, and risk record types for barangay crime-risk scoring.
//!
//! [`Area`] and [`Incident`] are read-only snapshots of the two external
//! collections. [`AreaRiskRecord`] is the derived per-area output of the
//! scoring pipeline and is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Ordinal risk label assigned to an area by clustering its crime rate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskLevel {
    /// Cluster with the smallest centroid.
    Low,
    /// Cluster with the middle centroid.
    Medium,
    /// Cluster with the largest centroid.
    High,
    /// Clustering was skipped (too few areas or a degenerate rate set).
    Unknown,
}

impl RiskLevel {
    /// Returns the label for a centroid rank (0 = smallest).
    ///
    /// Ranks past the third collapse to [`Self::High`].
    #[must_use]
    pub const fn from_rank(rank: usize) -> Self {
        match rank {
            0 => Self::Low,
            1 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Unknown]
    }
}

/// A named administrative subdivision with a population count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Document identifier.
    pub id: String,
    /// Area name; the join key against [`Incident::area_name`].
    #[serde(default)]
    pub name: String,
    /// Resident count. `None` when absent or not a positive number.
    #[serde(default)]
    pub population: Option<u64>,
    /// Descriptive district label, passed through untouched.
    #[serde(default)]
    pub district: Option<String>,
}

impl Area {
    /// Population used as the rate denominator, floored at 1.
    #[must_use]
    pub fn effective_population(&self) -> u64 {
        self.population.unwrap_or(1).max(1)
    }
}

/// A recorded crime event attributed to an area by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Document identifier.
    pub id: String,
    /// Free-text area name this incident was filed under.
    #[serde(default)]
    pub area_name: Option<String>,
    /// Offense description (e.g. `"Theft"`).
    #[serde(default)]
    pub offense: Option<String>,
    /// When the incident was committed.
    #[serde(default)]
    pub committed_at: Option<DateTime<Utc>>,
}

/// Per-area output of the scoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRiskRecord {
    /// Identifier of the source [`Area`].
    pub area_id: String,
    /// Area name as stored (not normalized).
    pub area_name: String,
    /// Population after the floor of 1 was applied.
    pub population: u64,
    /// District label copied from the area.
    pub district: Option<String>,
    /// Number of incidents whose normalized area name matched.
    pub incident_count: u64,
    /// Incidents per 1,000 residents. Not rounded.
    pub rate: f64,
    /// Ordinal risk label.
    pub risk_level: RiskLevel,
}

/// Number of records per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    /// Records labeled [`RiskLevel::Low`].
    pub low: u64,
    /// Records labeled [`RiskLevel::Medium`].
    pub medium: u64,
    /// Records labeled [`RiskLevel::High`].
    pub high: u64,
    /// Records labeled [`RiskLevel::Unknown`].
    pub unknown: u64,
    /// Total record count.
    pub total: u64,
}

impl RiskSummary {
    /// Tallies the risk levels of `records`.
    #[must_use]
    pub fn from_records(records: &[AreaRiskRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.risk_level {
                RiskLevel::Low => summary.low += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::High => summary.high += 1,
                RiskLevel::Unknown => summary.unknown += 1,
            }
            summary.total += 1;
        }
        summary
    }

    /// Returns the count for a single level.
    #[must_use]
    pub const fn count(&self, level: RiskLevel) -> u64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Unknown => self.unknown,
        }
    }
}
