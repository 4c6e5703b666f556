//! Geographic concentration limit.
//!
//! Computes which states an account may still buy into from the notes
//! export CSV: principal remaining on current notes is summed per state and
//! any state already holding more than `limit × account_total` is excluded.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

pub const STATE_ABBREVIATIONS: [&str; 50] = [
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "IA", "ID", "IL", "IN",
    "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE", "NH",
    "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VA",
    "VT", "WA", "WI", "WV", "WY",
];

/// Column holding principal remaining in the notes export.
const PRINCIPAL_REMAINING_COLUMN: usize = 10;
const CURRENT_STATUS: &str = "Current";

/// Every state abbreviation, for accounts without a concentration limit.
pub fn all_states() -> Vec<String> {
    STATE_ABBREVIATIONS.iter().map(|s| s.to_string()).collect()
}

pub fn from_csv_path(path: &Path, limit: Decimal, account_total: Decimal) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open notes CSV: {}", path.display()))?;
    from_csv_reader(file, limit, account_total)
        .with_context(|| format!("Failed to compute allowed states from {}", path.display()))
}

/// Allowed states, sorted alphabetically. States with no holdings are
/// always allowed.
pub fn from_csv_reader<R: Read>(
    reader: R,
    limit: Decimal,
    account_total: Decimal,
) -> Result<Vec<String>> {
    let mut totals: BTreeMap<&'static str, Decimal> =
        STATE_ABBREVIATIONS.iter().map(|s| (*s, Decimal::ZERO)).collect();

    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    for (row, record) in csv.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV row {}", row + 2))?;

        if !record.iter().any(|field| field == CURRENT_STATUS) {
            continue;
        }

        let Some(state) = record
            .iter()
            .find_map(|field| STATE_ABBREVIATIONS.iter().find(|s| **s == field))
        else {
            warn!(row = row + 2, "Current note without a state, skipping");
            continue;
        };

        let principal = record
            .get(PRINCIPAL_REMAINING_COLUMN)
            .with_context(|| format!("Row {} has no principal column", row + 2))?;
        let principal = Decimal::from_str(principal.trim())
            .with_context(|| format!("Row {}: invalid principal {principal:?}", row + 2))?;

        if let Some(total) = totals.get_mut(*state) {
            *total += principal.round_dp(2);
        }
    }

    let ceiling = limit * account_total;
    let allowed: Vec<String> = totals
        .into_iter()
        .filter(|(_, held)| *held <= ceiling)
        .map(|(state, _)| state.to_string())
        .collect();

    debug!(
        allowed = allowed.len(),
        ceiling = %ceiling,
        "State concentration computed"
    );

    Ok(allowed)
}
