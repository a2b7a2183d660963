//! Optional narrowing of the incident set before counting.

use barangay_risk_models::Incident;
use chrono::{DateTime, Utc};

/// Restricts which incidents are counted toward area rates.
///
/// The default filter keeps every incident.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    /// Keep incidents committed at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Keep incidents committed at or before this instant.
    pub until: Option<DateTime<Utc>>,
    /// Keep incidents whose offense matches (case-insensitive, trimmed).
    pub offense: Option<String>,
}

impl IncidentFilter {
    /// Returns `true` if no constraint is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.since.is_none() && self.until.is_none() && self.offense.is_none()
    }

    /// Returns `true` if `incident` passes every constraint.
    ///
    /// When a date bound is set, incidents without a timestamp are rejected.
    #[must_use]
    pub fn matches(&self, incident: &Incident) -> bool {
        if self.since.is_some() || self.until.is_some() {
            let Some(at) = incident.committed_at else {
                return false;
            };
            if self.since.is_some_and(|since| at < since) {
                return false;
            }
            if self.until.is_some_and(|until| at > until) {
                return false;
            }
        }

        if let Some(wanted) = &self.offense {
            let wanted = wanted.trim().to_lowercase();
            let offense = incident
                .offense
                .as_deref()
                .map(|o| o.trim().to_lowercase());
            if offense.as_deref() != Some(wanted.as_str()) {
                return false;
            }
        }

        true
    }
}
