//! Incident counting and rate computation.

use std::collections::BTreeMap;

use barangay_risk_models::{AreaRiskRecord, Incident};

/// Incidents are expressed per this many residents.
pub const RATE_PER_RESIDENTS: f64 = 1000.0;

/// Normalizes an area name for joining: trims surrounding whitespace and
/// lower-cases.
#[must_use]
pub fn normalize_area_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Counts incidents per normalized area name.
///
/// Incidents with a missing or blank area name are skipped.
#[must_use]
pub fn count_incidents_by_area<'a, I>(incidents: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Incident>,
{
    let mut counts = BTreeMap::new();
    for incident in incidents {
        let Some(name) = incident.area_name.as_deref() else {
            continue;
        };
        let key = normalize_area_name(name);
        if key.is_empty() {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Incidents per 1,000 residents. `population` is floored at 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn crime_rate(count: u64, population: u64) -> f64 {
    (count as f64 / population.max(1) as f64) * RATE_PER_RESIDENTS
}

/// Returns the records whose area name matches `name` after normalization.
#[must_use]
pub fn filter_by_area<'a>(records: &'a [AreaRiskRecord], name: &str) -> Vec<&'a AreaRiskRecord> {
    let key = normalize_area_name(name);
    records
        .iter()
        .filter(|r| normalize_area_name(&r.area_name) == key)
        .collect()
}

#[cfg(test)]
mod tests {
    use barangay_risk_models::RiskLevel;

    use super::*;

    fn incident(area_name: Option<&str>) -> Incident {
        Incident {
            id: "i".to_string(),
            area_name: area_name.map(String::from),
            ..Incident::default()
        }
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_area_name(" Talisay "), "talisay");
        assert_eq!(normalize_area_name("\tSAN ISIDRO\n"), "san isidro");
    }

    #[test]
    fn counts_by_normalized_name() {
        let incidents = vec![
            incident(Some("Talisay")),
            incident(Some(" talisay ")),
            incident(Some("TALISAY")),
            incident(Some("Bagumbayan")),
        ];
        let counts = count_incidents_by_area(&incidents);
        assert_eq!(counts.get("talisay"), Some(&3));
        assert_eq!(counts.get("bagumbayan"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn skips_missing_and_blank_names() {
        let incidents = vec![incident(None), incident(Some("")), incident(Some("   "))];
        assert!(count_incidents_by_area(&incidents).is_empty());
    }

    #[test]
    fn rate_is_per_thousand() {
        assert!((crime_rate(5, 1000) - 5.0).abs() < 1e-12);
        assert!((crime_rate(1, 4000) - 0.25).abs() < 1e-12);
        assert!(crime_rate(0, 1000).abs() < 1e-12);
    }

    #[test]
    fn rate_floors_population_at_one() {
        assert!((crime_rate(3, 0) - 3000.0).abs() < 1e-9);
        assert!(crime_rate(3, 0).is_finite());
    }

    #[test]
    fn filters_records_by_area_name() {
        let record = |name: &str| AreaRiskRecord {
            area_id: name.to_string(),
            area_name: name.to_string(),
            population: 1,
            district: None,
            incident_count: 0,
            rate: 0.0,
            risk_level: RiskLevel::Unknown,
        };
        let records = vec![record("Talisay"), record("Poblacion"), record("talisay ")];
        let found = filter_by_area(&records, "TALISAY");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].area_id, "Talisay");
        assert_eq!(found[1].area_id, "talisay ");
    }
}
