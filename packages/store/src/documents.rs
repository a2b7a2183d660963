//! Wire-format documents and their conversion into model types.
//!
//! Documents arrive loosely typed: any attribute may be missing, and
//! population may be stored as a number or a numeric string. Conversion
//! applies the defaulting rules once so the aggregator only sees
//! [`Area`] and [`Incident`].

use barangay_risk_models::{Area, Incident};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::StoreError;

/// An area document as stored in the areas collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AreaDocument {
    /// Document identifier.
    #[serde(rename = "$id", default)]
    pub id: String,
    /// Barangay name.
    #[serde(default)]
    pub barangay_name: Option<String>,
    /// Population as stored. Only positive values survive.
    #[serde(default, deserialize_with = "deserialize_population")]
    pub barangay_population: Option<u64>,
    /// District label.
    #[serde(default)]
    pub barangay_district: Option<String>,
}

impl From<AreaDocument> for Area {
    fn from(doc: AreaDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.barangay_name.unwrap_or_default(),
            population: doc.barangay_population,
            district: doc.barangay_district,
        }
    }
}

/// An incident document as stored in the crime records collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentDocument {
    /// Document identifier.
    #[serde(rename = "$id", default)]
    pub id: String,
    /// Free-text barangay name.
    #[serde(default)]
    pub barangay: Option<String>,
    /// Offense description.
    #[serde(default)]
    pub offense: Option<String>,
    /// Commit timestamp as stored (ISO 8601).
    #[serde(default)]
    pub date_time_committed: Option<String>,
}

impl From<IncidentDocument> for Incident {
    fn from(doc: IncidentDocument) -> Self {
        let committed_at = doc.date_time_committed.as_deref().and_then(parse_timestamp);
        Self {
            id: doc.id,
            area_name: doc.barangay,
            offense: doc.offense,
            committed_at,
        }
    }
}

/// Accepts a JSON number or numeric string. Fractions are truncated;
/// anything below 1, non-numeric, or null becomes `None`.
fn deserialize_population<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(population_from_value))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn population_from_value(value: &serde_json::Value) -> Option<u64> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() || number < 1.0 {
        return None;
    }
    Some(number.trunc() as u64)
}

/// Parses an RFC 3339 timestamp, falling back to naive date-times and
/// bare dates interpreted as UTC.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Extracts the document array from a list response.
///
/// Accepts either a bare array or an object with a `documents` array.
/// Returns the documents and the server-reported `total`, if present.
///
/// # Errors
///
/// Returns [`StoreError`] if the body has neither shape or a document does
/// not deserialize.
pub fn parse_document_list<T>(body: serde_json::Value) -> Result<(Vec<T>, Option<u64>), StoreError>
where
    T: for<'de> Deserialize<'de>,
{
    let (documents, total) = match body {
        serde_json::Value::Array(docs) => (docs, None),
        serde_json::Value::Object(mut map) => {
            let total = map.get("total").and_then(serde_json::Value::as_u64);
            match map.remove("documents") {
                Some(serde_json::Value::Array(docs)) => (docs, total),
                _ => {
                    return Err(StoreError::Response {
                        message: "response object has no 'documents' array".to_string(),
                    });
                }
            }
        }
        _ => {
            return Err(StoreError::Response {
                message: "response is neither an array nor a document list".to_string(),
            });
        }
    };

    let parsed = documents
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()?;

    Ok((parsed, total))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike as _, Timelike as _};

    use super::*;

    fn area(json: serde_json::Value) -> Area {
        serde_json::from_value::<AreaDocument>(json).unwrap().into()
    }

    #[test]
    fn converts_full_area_document() {
        let a = area(serde_json::json!({
            "$id": "abc",
            "barangay_name": "Talisay",
            "barangay_population": 1520,
            "barangay_district": "District 2",
            "$createdAt": "2024-01-01T00:00:00.000+00:00"
        }));
        assert_eq!(a.id, "abc");
        assert_eq!(a.name, "Talisay");
        assert_eq!(a.population, Some(1520));
        assert_eq!(a.district.as_deref(), Some("District 2"));
    }

    #[test]
    fn population_accepts_numeric_strings() {
        let a = area(serde_json::json!({ "$id": "x", "barangay_population": " 2400 " }));
        assert_eq!(a.population, Some(2400));
        let a = area(serde_json::json!({ "$id": "x", "barangay_population": 99.9 }));
        assert_eq!(a.population, Some(99));
    }

    #[test]
    fn population_defaults_when_unusable() {
        for raw in [
            serde_json::json!(0),
            serde_json::json!(-40),
            serde_json::json!("n/a"),
            serde_json::json!(null),
            serde_json::json!(true),
        ] {
            let a = area(serde_json::json!({ "$id": "x", "barangay_population": raw }));
            assert_eq!(a.population, None, "raw={raw}");
            assert_eq!(a.effective_population(), 1);
        }
        let a = area(serde_json::json!({ "$id": "x" }));
        assert_eq!(a.population, None);
        assert_eq!(a.name, "");
    }

    #[test]
    fn converts_incident_document() {
        let doc: IncidentDocument = serde_json::from_value(serde_json::json!({
            "$id": "c1",
            "barangay": " Talisay ",
            "offense": "Theft",
            "date_time_committed": "2024-05-03T14:30:00.000+00:00",
            "batch_number": "B-12"
        }))
        .unwrap();
        let incident: Incident = doc.into();
        assert_eq!(incident.area_name.as_deref(), Some(" Talisay "));
        assert_eq!(incident.offense.as_deref(), Some("Theft"));
        let at = incident.committed_at.unwrap();
        assert_eq!((at.year(), at.month(), at.day()), (2024, 5, 3));
        assert_eq!(at.hour(), 14);
    }

    #[test]
    fn parses_timestamp_variants() {
        assert!(parse_timestamp("2024-05-03T14:30:00+08:00").is_some());
        assert!(parse_timestamp("2024-05-03T14:30:00").is_some());
        assert!(parse_timestamp("2024-05-03 14:30:00").is_some());
        assert!(parse_timestamp("2024-05-03").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn offset_timestamps_convert_to_utc() {
        let at = parse_timestamp("2024-05-03T01:00:00+08:00").unwrap();
        assert_eq!((at.day(), at.hour()), (2, 17));
    }

    #[test]
    fn parses_wrapped_and_bare_lists() {
        let (docs, total) = parse_document_list::<IncidentDocument>(serde_json::json!({
            "total": 3,
            "documents": [{ "$id": "a" }, { "$id": "b" }]
        }))
        .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(total, Some(3));

        let (docs, total) =
            parse_document_list::<IncidentDocument>(serde_json::json!([{ "$id": "a" }])).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(total, None);
    }

    #[test]
    fn rejects_unexpected_list_shapes() {
        let err =
            parse_document_list::<IncidentDocument>(serde_json::json!({ "rows": [] })).unwrap_err();
        assert!(matches!(err, StoreError::Response { .. }));
        assert!(parse_document_list::<IncidentDocument>(serde_json::json!("nope")).is_err());
    }
}
