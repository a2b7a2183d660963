//! Plain-text rendering of risk records and summaries.

use std::fmt::Write as _;

use barangay_risk_models::{AreaRiskRecord, RiskLevel, RiskSummary};

/// Formats records as an aligned table. Rates are rounded to 2 decimals.
#[must_use]
pub fn records_table(records: &[&AreaRiskRecord]) -> String {
    let name_width = records
        .iter()
        .map(|r| r.area_name.chars().count())
        .chain(std::iter::once("Barangay".len()))
        .max()
        .unwrap_or(0);
    let district_width = records
        .iter()
        .filter_map(|r| r.district.as_deref())
        .map(|d| d.chars().count())
        .chain(std::iter::once("District".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<district_width$}  {:>10}  {:>9}  {:>10}  Risk",
        "Barangay", "District", "Population", "Incidents", "Rate/1k",
    );
    for r in records {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<district_width$}  {:>10}  {:>9}  {:>10.2}  {}",
            r.area_name,
            r.district.as_deref().unwrap_or("-"),
            r.population,
            r.incident_count,
            r.rate,
            r.risk_level,
        );
    }
    out
}

/// Formats the risk distribution, one level per line.
#[must_use]
pub fn summary_text(summary: &RiskSummary) -> String {
    let mut out = String::new();
    for level in RiskLevel::all() {
        let _ = writeln!(out, "{:<8} {}", level.to_string(), summary.count(*level));
    }
    let _ = writeln!(out, "{:<8} {}", "Total", summary.total);
    out
}

/// Joins an error and its sources into a single `a: b: c` line.
#[must_use]
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        let _ = write!(out, ": {e}");
        source = e.source();
    }
    out
}
