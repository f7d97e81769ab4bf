use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::models::{HouseholdRecord, RawHousehold};

/// CSV row accepted by `import`; the id may be left blank for new households.
#[derive(Debug, Deserialize)]
pub struct ImportRow {
    pub id: Option<String>,
    pub name: String,
    pub dusun: String,
    pub income: i64,
    pub age_of_head: i32,
    pub dependents: i32,
    pub health_condition: String,
    pub housing_condition: String,
    pub asset_ownership: String,
}

impl ImportRow {
    pub fn into_raw(self, id: String) -> RawHousehold {
        RawHousehold {
            id,
            name: self.name,
            dusun: self.dusun,
            income: self.income,
            age_of_head: self.age_of_head,
            dependents: self.dependents,
            health_condition: self.health_condition,
            housing_condition: self.housing_condition,
            asset_ownership: self.asset_ownership,
        }
    }
}

pub fn read_import_rows(csv_path: &Path) -> anyhow::Result<Vec<ImportRow>> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    parse_import_rows(reader)
}

fn parse_import_rows<R: std::io::Read>(mut reader: csv::Reader<R>) -> anyhow::Result<Vec<ImportRow>> {
    let mut rows = Vec::new();
    for (line, result) in reader.deserialize::<ImportRow>().enumerate() {
        let mut row = result.with_context(|| format!("invalid household row {}", line + 1))?;
        row.id = row.id.filter(|id| !id.trim().is_empty());
        rows.push(row);
    }
    Ok(rows)
}

/// Reads a household CSV for offline ranking. Every row needs an id, since
/// ids order tied households.
pub fn read_households(csv_path: &Path) -> anyhow::Result<Vec<RawHousehold>> {
    let rows = read_import_rows(csv_path)?;
    let households = with_required_ids(rows)?;
    tracing::info!(
        path = %csv_path.display(),
        households = households.len(),
        "loaded households from csv"
    );
    Ok(households)
}

fn with_required_ids(rows: Vec<ImportRow>) -> anyhow::Result<Vec<RawHousehold>> {
    let mut households = Vec::with_capacity(rows.len());
    for (line, row) in rows.into_iter().enumerate() {
        let Some(id) = row.id.clone() else {
            bail!("household row {} ({}) has no id", line + 1, row.name);
        };
        households.push(row.into_raw(id));
    }
    Ok(households)
}

/// Prepares rows for import. Rows without an id get one from `mint_id`.
/// Every row must pass household validation before any of them is returned,
/// so a bad label blocks the whole file.
pub fn validate_imports(
    rows: Vec<ImportRow>,
    mut mint_id: impl FnMut() -> String,
) -> anyhow::Result<Vec<RawHousehold>> {
    let mut households = Vec::with_capacity(rows.len());
    for (line, row) in rows.into_iter().enumerate() {
        let id = row.id.clone().unwrap_or_else(&mut mint_id);
        let household = row.into_raw(id);
        HouseholdRecord::try_from(&household)
            .with_context(|| format!("invalid household row {}", line + 1))?;
        households.push(household);
    }
    Ok(households)
}
