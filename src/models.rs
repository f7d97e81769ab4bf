use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::criteria::{
    AssetOwnership, Criterion, HealthCondition, HousingCondition, OrdinalScale,
};
use crate::error::RankingError;

/// Household row as stored or imported, before labels are validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHousehold {
    pub id: String,
    pub name: String,
    pub dusun: String,
    pub income: i64,
    pub age_of_head: i32,
    pub dependents: i32,
    pub health_condition: String,
    pub housing_condition: String,
    pub asset_ownership: String,
}

/// Validated household, ready for scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseholdRecord {
    pub id: String,
    pub name: String,
    pub dusun: String,
    /// Monthly income in rupiah.
    pub income: u64,
    pub age_of_head: u32,
    pub dependents: u32,
    pub health_condition: HealthCondition,
    pub housing_condition: HousingCondition,
    pub asset_ownership: AssetOwnership,
}

impl HouseholdRecord {
    /// Raw value of a criterion: the number itself, or the ordinal rank.
    pub fn raw_value(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Income => self.income as f64,
            Criterion::AgeOfHead => f64::from(self.age_of_head),
            Criterion::Dependents => f64::from(self.dependents),
            Criterion::HealthCondition => f64::from(self.health_condition.rank()),
            Criterion::HousingCondition => f64::from(self.housing_condition.rank()),
            Criterion::AssetOwnership => f64::from(self.asset_ownership.rank()),
        }
    }
}

impl TryFrom<&RawHousehold> for HouseholdRecord {
    type Error = RankingError;

    fn try_from(raw: &RawHousehold) -> Result<Self, Self::Error> {
        let id = raw.id.as_str();
        Ok(Self {
            id: raw.id.clone(),
            name: raw.name.clone(),
            dusun: raw.dusun.clone(),
            income: non_negative(id, Criterion::Income, raw.income)?,
            age_of_head: non_negative(id, Criterion::AgeOfHead, i64::from(raw.age_of_head))?,
            dependents: non_negative(id, Criterion::Dependents, i64::from(raw.dependents))?,
            health_condition: HealthCondition::parse_for(id, &raw.health_condition)?,
            housing_condition: HousingCondition::parse_for(id, &raw.housing_condition)?,
            asset_ownership: AssetOwnership::parse_for(id, &raw.asset_ownership)?,
        })
    }
}

fn non_negative<T: TryFrom<i64>>(
    household_id: &str,
    criterion: Criterion,
    value: i64,
) -> Result<T, RankingError> {
    T::try_from(value).map_err(|_| RankingError::InvalidValue {
        household_id: household_id.to_string(),
        criterion,
        value,
    })
}

/// Validates a whole batch; the first bad row aborts it.
pub fn parse_households(rows: &[RawHousehold]) -> Result<Vec<HouseholdRecord>, RankingError> {
    rows.iter().map(HouseholdRecord::try_from).collect()
}

/// One household's place in the priority list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub household_id: String,
    pub name: String,
    pub dusun: String,
    pub final_score: f64,
    pub rank: usize,
    pub utilities: BTreeMap<Criterion, f64>,
}

#[derive(Debug, Clone)]
pub struct DusunSummary {
    pub dusun: String,
    pub household_count: usize,
    pub avg_score: f64,
    pub top_household: String,
    pub top_rank: usize,
}
