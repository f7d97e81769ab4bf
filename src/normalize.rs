//! Criterion normalization.
//!
//! Every raw value becomes a utility in `[0, 1]`:
//! - benefit: `(v - min) / (max - min)`
//! - cost: `min / v`
//!
//! Numeric criteria take `min`/`max` from the household collection; ordinal
//! criteria use the fixed rank bounds 1 and 5. A degenerate range
//! (`max == min`) yields 1.0 for everyone, as does a cost value of zero.
//! Under cost polarity the ordinal max has no effect: rank r scores `1/r`, so
//! the worst level (rank 5) scores 0.2, not 0.

use std::collections::BTreeSet;

use crate::criteria::{Criterion, CriterionKind, Polarity, ORDINAL_MAX_RANK, ORDINAL_MIN_RANK};
use crate::error::RankingError;
use crate::models::HouseholdRecord;
use crate::policy::PolarityProfile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    fn ordinal() -> Self {
        Self {
            min: f64::from(ORDINAL_MIN_RANK),
            max: f64::from(ORDINAL_MAX_RANK),
        }
    }

    fn is_degenerate(&self) -> bool {
        self.max == self.min
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub household_id: String,
    /// Utilities in [`Criterion::ALL`] order.
    pub utilities: [f64; 6],
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMatrix {
    columns: [Criterion; 6],
    rows: Vec<NormalizedRow>,
}

impl NormalizedMatrix {
    pub fn columns(&self) -> &[Criterion] {
        &self.columns
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    #[cfg(test)]
    pub fn utility(&self, row: usize, criterion: Criterion) -> Option<f64> {
        let column = self.columns.iter().position(|c| *c == criterion)?;
        self.rows.get(row).map(|r| r.utilities[column])
    }
}

/// Normalizes the whole collection. Fails on an empty collection or a
/// repeated household id.
pub fn normalize(
    households: &[HouseholdRecord],
    polarity: &PolarityProfile,
) -> Result<NormalizedMatrix, RankingError> {
    if households.is_empty() {
        return Err(RankingError::EmptyInputSet);
    }

    let mut seen = BTreeSet::new();
    for household in households {
        if !seen.insert(household.id.as_str()) {
            return Err(RankingError::DuplicateHousehold(household.id.clone()));
        }
    }

    let columns = Criterion::ALL;
    let mut bounds = [Bounds::ordinal(); 6];
    for criterion in columns {
        if criterion.kind() == CriterionKind::Numeric {
            let slot = &mut bounds[criterion.index()];
            *slot = collection_bounds(households, criterion);
            tracing::debug!(
                criterion = %criterion,
                min = slot.min,
                max = slot.max,
                "numeric criterion bounds"
            );
        }
    }

    let mut rows = Vec::with_capacity(households.len());
    for household in households {
        let mut utilities = [0.0; 6];
        for criterion in columns {
            utilities[criterion.index()] = utility(
                &household.id,
                criterion,
                household.raw_value(criterion),
                bounds[criterion.index()],
                polarity.get(criterion),
            )?;
        }
        rows.push(NormalizedRow {
            household_id: household.id.clone(),
            utilities,
        });
    }

    Ok(NormalizedMatrix { columns, rows })
}

fn collection_bounds(households: &[HouseholdRecord], criterion: Criterion) -> Bounds {
    households.iter().map(|h| h.raw_value(criterion)).fold(
        Bounds {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        },
        |acc, value| Bounds {
            min: acc.min.min(value),
            max: acc.max.max(value),
        },
    )
}

/// Utility of one raw value within `bounds`.
pub(crate) fn utility(
    household_id: &str,
    criterion: Criterion,
    value: f64,
    bounds: Bounds,
    polarity: Polarity,
) -> Result<f64, RankingError> {
    if bounds.is_degenerate() {
        return Ok(1.0);
    }

    let raw = match polarity {
        Polarity::Benefit => (value - bounds.min) / (bounds.max - bounds.min),
        Polarity::Cost => {
            if value == 0.0 {
                // Zero is only reachable as the minimum: the lowest possible cost.
                if bounds.min != 0.0 {
                    return Err(RankingError::DivisionByZero {
                        household_id: household_id.to_string(),
                        criterion,
                    });
                }
                1.0
            } else {
                bounds.min / value
            }
        }
    };

    Ok(raw.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{AssetOwnership, HealthCondition, HousingCondition};
    use proptest::prelude::*;

    fn household(id: &str, income: u64, age: u32, dependents: u32) -> HouseholdRecord {
        HouseholdRecord {
            id: id.to_string(),
            name: format!("Kepala {id}"),
            dusun: "Krajan".to_string(),
            income,
            age_of_head: age,
            dependents,
            health_condition: HealthCondition::Healthy,
            housing_condition: HousingCondition::SemiPermanent,
            asset_ownership: AssetOwnership::NoAssets,
        }
    }

    fn column(matrix: &NormalizedMatrix, criterion: Criterion) -> Vec<f64> {
        (0..matrix.rows().len())
            .map(|row| matrix.utility(row, criterion).unwrap())
            .collect()
    }

    #[test]
    fn empty_collection_is_rejected() {
        let err = normalize(&[], &PolarityProfile::default()).unwrap_err();
        assert_eq!(err, RankingError::EmptyInputSet);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let households = vec![household("A", 1, 40, 1), household("A", 2, 41, 2)];
        let err = normalize(&households, &PolarityProfile::default()).unwrap_err();
        assert_eq!(err, RankingError::DuplicateHousehold("A".to_string()));
    }

    #[test]
    fn income_uses_cost_formula() {
        let households = vec![
            household("A", 1_000_000, 40, 2),
            household("B", 2_000_000, 40, 2),
            household("C", 4_000_000, 40, 2),
        ];
        let matrix = normalize(&households, &PolarityProfile::default()).unwrap();
        assert_eq!(column(&matrix, Criterion::Income), vec![1.0, 0.5, 0.25]);
    }

    #[test]
    fn dependents_use_min_max_formula() {
        let households = vec![
            household("A", 1, 40, 0),
            household("B", 1, 40, 2),
            household("C", 1, 40, 4),
        ];
        let matrix = normalize(&households, &PolarityProfile::default()).unwrap();
        assert_eq!(column(&matrix, Criterion::Dependents), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn degenerate_range_yields_full_utility() {
        let households = vec![household("A", 900_000, 40, 3), household("B", 900_000, 55, 3)];
        let matrix = normalize(&households, &PolarityProfile::default()).unwrap();
        assert_eq!(column(&matrix, Criterion::Income), vec![1.0, 1.0]);
        assert_eq!(column(&matrix, Criterion::Dependents), vec![1.0, 1.0]);
    }

    #[test]
    fn zero_income_is_the_best_cost() {
        let households = vec![household("A", 0, 40, 1), household("B", 500_000, 40, 1)];
        let matrix = normalize(&households, &PolarityProfile::default()).unwrap();
        assert_eq!(column(&matrix, Criterion::Income), vec![1.0, 0.0]);
    }

    #[test]
    fn zero_cost_below_a_positive_minimum_is_division_by_zero() {
        let bounds = Bounds { min: 1.0, max: 5.0 };
        let err = utility("X", Criterion::Income, 0.0, bounds, Polarity::Cost).unwrap_err();
        assert!(matches!(err, RankingError::DivisionByZero { .. }));
    }

    #[test]
    fn ordinal_bounds_are_fixed_regardless_of_collection() {
        let mut best = household("A", 1, 40, 1);
        best.housing_condition = HousingCondition::PermanentMinorDamage;
        let mut worst = household("B", 1, 40, 1);
        worst.housing_condition = HousingCondition::NonPermanent;

        let matrix = normalize(&[best, worst], &PolarityProfile::default()).unwrap();
        // cost over ranks 2 and 4 with fixed min 1
        assert_eq!(column(&matrix, Criterion::HousingCondition), vec![0.5, 0.25]);

        let benefit = PolarityProfile::default().with(Criterion::HousingCondition, Polarity::Benefit);
        let mut a = household("A", 1, 40, 1);
        a.housing_condition = HousingCondition::PermanentMinorDamage;
        let mut b = household("B", 1, 40, 1);
        b.housing_condition = HousingCondition::Uninhabitable;
        let matrix = normalize(&[a, b], &benefit).unwrap();
        assert_eq!(column(&matrix, Criterion::HousingCondition), vec![0.25, 1.0]);
    }

    #[test]
    fn single_household_gets_full_numeric_utility() {
        let matrix = normalize(&[household("A", 750_000, 61, 4)], &PolarityProfile::default())
            .unwrap();
        assert_eq!(matrix.rows().len(), 1);
        assert_eq!(matrix.utility(0, Criterion::Income), Some(1.0));
        assert_eq!(matrix.utility(0, Criterion::AgeOfHead), Some(1.0));
        // ordinal scale does not collapse: healthy is rank 1 under cost
        assert_eq!(matrix.utility(0, Criterion::HealthCondition), Some(1.0));
        assert_eq!(matrix.utility(0, Criterion::AssetOwnership), Some(0.2));
    }

    fn households_strategy() -> impl Strategy<Value = Vec<(u64, u32, u32)>> {
        prop::collection::vec((0u64..10_000_000, 18u32..100, 0u32..12), 1..12)
    }

    fn build(raw: &[(u64, u32, u32)]) -> Vec<HouseholdRecord> {
        raw.iter()
            .enumerate()
            .map(|(i, (income, age, dependents))| {
                household(&format!("H{i:03}"), *income, *age, *dependents)
            })
            .collect()
    }

    proptest! {
        #[test]
        fn prop_utilities_stay_within_unit_interval(raw in households_strategy()) {
            let matrix = normalize(&build(&raw), &PolarityProfile::default()).unwrap();
            for row in matrix.rows() {
                for value in row.utilities {
                    prop_assert!((0.0..=1.0).contains(&value));
                }
            }
        }

        #[test]
        fn prop_benefit_utility_never_drops_when_value_rises(
            raw in households_strategy(),
            bump in 1u32..10,
        ) {
            let before = normalize(&build(&raw), &PolarityProfile::default()).unwrap();
            let mut raised = raw.clone();
            raised[0].2 += bump;
            let after = normalize(&build(&raised), &PolarityProfile::default()).unwrap();
            prop_assert!(
                after.utility(0, Criterion::Dependents).unwrap()
                    >= before.utility(0, Criterion::Dependents).unwrap()
            );
        }

        #[test]
        fn prop_cost_utility_never_rises_when_value_rises(
            raw in households_strategy(),
            bump in 1u64..1_000_000,
        ) {
            let before = normalize(&build(&raw), &PolarityProfile::default()).unwrap();
            let mut raised = raw.clone();
            raised[0].0 += bump;
            let after = normalize(&build(&raised), &PolarityProfile::default()).unwrap();
            prop_assert!(
                after.utility(0, Criterion::Income).unwrap()
                    <= before.utility(0, Criterion::Income).unwrap()
            );
        }
    }
}
