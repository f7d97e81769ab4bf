use std::collections::BTreeMap;

use crate::criteria::Criterion;
use crate::error::RankingError;
use crate::models::{parse_households, HouseholdRecord, RankedResult, RawHousehold};
use crate::normalize::{normalize, NormalizedMatrix};
use crate::policy::RankingPolicy;
use crate::weights::WeightVector;

/// Scores closer than this are treated as a tie and ordered by household id.
pub const SCORE_TIE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightMode {
    /// Reject weights that do not already sum to 1.0.
    #[default]
    Strict,
    /// Rescale weights to sum to 1.0 before use.
    Normalize,
}

/// Weighted sum of utilities per matrix row.
pub fn aggregate(
    matrix: &NormalizedMatrix,
    weights: &WeightVector,
    mode: WeightMode,
) -> Result<Vec<f64>, RankingError> {
    let weights = effective_weights(weights, matrix.columns(), mode)?;
    let column_weights: Vec<f64> = matrix
        .columns()
        .iter()
        .map(|criterion| weights.get(*criterion).unwrap_or(0.0))
        .collect();

    Ok(matrix
        .rows()
        .iter()
        .map(|row| {
            row.utilities
                .iter()
                .zip(&column_weights)
                .map(|(utility, weight)| utility * weight)
                .sum::<f64>()
                .clamp(0.0, 1.0)
        })
        .collect())
}

/// Validated weights as they will be applied to `columns`.
pub fn effective_weights(
    weights: &WeightVector,
    columns: &[Criterion],
    mode: WeightMode,
) -> Result<WeightVector, RankingError> {
    weights.check_shape(columns)?;
    let weights = match mode {
        WeightMode::Strict => weights.clone(),
        WeightMode::Normalize => weights.normalized()?,
    };
    weights.check_unit_sum()?;
    Ok(weights)
}

/// Row indices in rank order: score descending, near-equal scores by id ascending.
pub fn rank_order(ids: &[&str], scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .total_cmp(&scores[a])
            .then_with(|| ids[a].cmp(ids[b]))
    });

    // A tie group holds every score within tolerance of its highest member.
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len()
            && scores[order[start]] - scores[order[end]] <= SCORE_TIE_TOLERANCE
        {
            end += 1;
        }
        order[start..end].sort_by(|&a, &b| ids[a].cmp(ids[b]));
        start = end;
    }

    order
}

/// Stateless SAW engine applying one ranking policy.
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    policy: RankingPolicy,
    weight_mode: WeightMode,
}

impl RankingEngine {
    pub fn new(policy: RankingPolicy) -> Self {
        Self {
            policy,
            weight_mode: WeightMode::Strict,
        }
    }

    pub fn normalize_weights(mut self, enabled: bool) -> Self {
        self.weight_mode = if enabled {
            WeightMode::Normalize
        } else {
            WeightMode::Strict
        };
        self
    }

    pub fn policy(&self) -> &RankingPolicy {
        &self.policy
    }

    /// Weights after validation and, when enabled, rescaling.
    pub fn weights(&self) -> Result<WeightVector, RankingError> {
        effective_weights(&self.policy.weights, &Criterion::ALL, self.weight_mode)
    }

    pub fn rank(&self, households: &[HouseholdRecord]) -> Result<Vec<RankedResult>, RankingError> {
        let matrix = normalize(households, &self.policy.polarity)?;
        let scores = aggregate(&matrix, &self.policy.weights, self.weight_mode)?;
        let ids: Vec<&str> = households.iter().map(|h| h.id.as_str()).collect();

        let results: Vec<RankedResult> = rank_order(&ids, &scores)
            .into_iter()
            .enumerate()
            .map(|(position, row)| {
                let household = &households[row];
                let utilities: BTreeMap<Criterion, f64> = matrix
                    .columns()
                    .iter()
                    .copied()
                    .zip(matrix.rows()[row].utilities)
                    .collect();
                RankedResult {
                    household_id: household.id.clone(),
                    name: household.name.clone(),
                    dusun: household.dusun.clone(),
                    final_score: scores[row],
                    rank: position + 1,
                    utilities,
                }
            })
            .collect();

        if let Some(top) = results.first() {
            tracing::info!(
                households = results.len(),
                top_household = %top.household_id,
                top_score = top.final_score,
                "ranked households"
            );
        }

        Ok(results)
    }

    /// Validates raw rows and ranks them; any invalid row aborts the batch.
    pub fn rank_raw(&self, rows: &[RawHousehold]) -> Result<Vec<RankedResult>, RankingError> {
        if rows.is_empty() {
            return Err(RankingError::EmptyInputSet);
        }
        let households = parse_households(rows)?;
        self.rank(&households)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{AssetOwnership, HealthCondition, HousingCondition, OrdinalScale};
    use proptest::prelude::*;

    fn household(id: &str, income: u64, dependents: u32) -> HouseholdRecord {
        HouseholdRecord {
            id: id.to_string(),
            name: format!("Kepala {id}"),
            dusun: "Sukamaju".to_string(),
            income,
            age_of_head: 45,
            dependents,
            health_condition: HealthCondition::MinorIllness,
            housing_condition: HousingCondition::SemiPermanent,
            asset_ownership: AssetOwnership::SmallAssets,
        }
    }

    fn equal_weights() -> WeightVector {
        WeightVector::new(Criterion::ALL.into_iter().map(|c| (c, 1.0 / 6.0)).collect())
    }

    fn engine(weights: WeightVector) -> RankingEngine {
        RankingEngine::new(RankingPolicy::new(weights, Default::default()))
    }

    fn order_of(results: &[RankedResult]) -> Vec<&str> {
        results.iter().map(|r| r.household_id.as_str()).collect()
    }

    #[test]
    fn lower_income_ranks_higher() {
        let households = vec![
            household("B", 2_000_000, 2),
            household("C", 3_000_000, 2),
            household("A", 1_000_000, 2),
        ];
        let results = engine(equal_weights()).rank(&households).unwrap();
        assert_eq!(order_of(&results), vec!["A", "B", "C"]);
        assert_eq!(
            results.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn swapping_dependents_only_reorders_the_swapped_pair() {
        let weights = WeightVector::new(BTreeMap::from([
            (Criterion::Income, 0.2),
            (Criterion::AgeOfHead, 0.1),
            (Criterion::Dependents, 0.4),
            (Criterion::HealthCondition, 0.1),
            (Criterion::HousingCondition, 0.1),
            (Criterion::AssetOwnership, 0.1),
        ]));
        let before = vec![
            household("A", 1_000_000, 4),
            household("B", 2_000_000, 1),
            household("C", 3_000_000, 4),
        ];
        let after = vec![
            household("A", 1_000_000, 4),
            household("B", 2_000_000, 4),
            household("C", 3_000_000, 1),
        ];

        let before = engine(weights.clone()).rank(&before).unwrap();
        let after = engine(weights).rank(&after).unwrap();

        assert_eq!(order_of(&before), vec!["A", "C", "B"]);
        assert_eq!(order_of(&after), vec!["A", "B", "C"]);
    }

    #[test]
    fn ties_break_by_household_id() {
        let households = vec![
            household("KK-09", 1_500_000, 3),
            household("KK-02", 1_500_000, 3),
            household("KK-05", 1_500_000, 3),
        ];
        let results = engine(equal_weights()).rank(&households).unwrap();
        assert_eq!(order_of(&results), vec!["KK-02", "KK-05", "KK-09"]);
    }

    #[test]
    fn near_ties_within_tolerance_use_id_order() {
        let ids = ["b", "a", "c"];
        let scores = [0.5, 0.5 - 1e-12, 0.4];
        assert_eq!(rank_order(&ids, &scores), vec![1, 0, 2]);

        let scores = [0.5, 0.5 - 1e-6, 0.4];
        assert_eq!(rank_order(&ids, &scores), vec![0, 1, 2]);
    }

    #[test]
    fn tie_group_is_anchored_on_its_highest_score() {
        // "a" is within tolerance of "b" but not of the group leader "c".
        let ids = ["c", "b", "a"];
        let scores = [0.5, 0.5 - 0.8e-9, 0.5 - 1.6e-9];
        let order: Vec<&str> = rank_order(&ids, &scores)
            .into_iter()
            .map(|row| ids[row])
            .collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn weight_sum_is_enforced_unless_normalizing() {
        let households = vec![household("A", 1, 1), household("B", 2, 2)];
        let heavy = WeightVector::new(Criterion::ALL.into_iter().map(|c| (c, 0.2)).collect());

        let err = engine(heavy.clone()).rank(&households).unwrap_err();
        assert!(matches!(err, RankingError::WeightMismatch(_)));

        let results = engine(heavy).normalize_weights(true).rank(&households).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn missing_weight_is_rejected() {
        let weights = WeightVector::new(BTreeMap::from([(Criterion::Income, 1.0)]));
        let err = engine(weights).rank(&[household("A", 1, 1)]).unwrap_err();
        assert!(matches!(err, RankingError::WeightMismatch(_)));
    }

    #[test]
    fn unknown_housing_label_blocks_the_whole_batch() {
        let row = RawHousehold {
            id: "KK-11".to_string(),
            name: "Wagiman".to_string(),
            dusun: "Krajan".to_string(),
            income: 800_000,
            age_of_head: 70,
            dependents: 2,
            health_condition: "healthy".to_string(),
            housing_condition: "palatial".to_string(),
            asset_ownership: "no_assets".to_string(),
        };
        let err = RankingEngine::default().rank_raw(&[row]).unwrap_err();
        assert_eq!(
            err,
            RankingError::UnknownCategory {
                household_id: "KK-11".to_string(),
                criterion: Criterion::HousingCondition,
                label: "palatial".to_string(),
            }
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(
            RankingEngine::default().rank(&[]).unwrap_err(),
            RankingError::EmptyInputSet
        );
        assert_eq!(
            RankingEngine::default().rank_raw(&[]).unwrap_err(),
            RankingError::EmptyInputSet
        );
    }

    #[test]
    fn results_carry_utilities_that_reproduce_the_score() {
        let households = vec![household("A", 1_000_000, 1), household("B", 4_000_000, 3)];
        let engine = RankingEngine::default();
        let weights = engine.weights().unwrap();
        for result in engine.rank(&households).unwrap() {
            let recomputed: f64 = result
                .utilities
                .iter()
                .map(|(criterion, utility)| weights.get(*criterion).unwrap() * utility)
                .sum();
            assert!((recomputed - result.final_score).abs() < 1e-12);
        }
    }

    fn collection() -> impl Strategy<Value = Vec<HouseholdRecord>> {
        prop::collection::vec(
            (0u64..5_000_000, 20u32..90, 0u32..10, 0usize..5, 0usize..5, 0usize..5),
            1..16,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (income, age, dependents, health, housing, assets))| HouseholdRecord {
                    id: format!("KK-{i:03}"),
                    name: format!("Kepala {i}"),
                    dusun: "Tegalsari".to_string(),
                    income,
                    age_of_head: age,
                    dependents,
                    health_condition: HealthCondition::LEVELS[health],
                    housing_condition: HousingCondition::LEVELS[housing],
                    asset_ownership: AssetOwnership::LEVELS[assets],
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_scores_are_bounded(households in collection()) {
            for result in RankingEngine::default().rank(&households).unwrap() {
                prop_assert!((0.0..=1.0).contains(&result.final_score));
            }
        }

        #[test]
        fn prop_ranks_cover_one_to_n(households in collection()) {
            let results = RankingEngine::default().rank(&households).unwrap();
            let mut ranks: Vec<usize> = results.iter().map(|r| r.rank).collect();
            ranks.sort_unstable();
            prop_assert_eq!(ranks, (1..=households.len()).collect::<Vec<_>>());

            let mut ids: Vec<&str> = results.iter().map(|r| r.household_id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), households.len());
        }

        #[test]
        fn prop_scores_descend_with_rank(households in collection()) {
            let results = RankingEngine::default().rank(&households).unwrap();
            for pair in results.windows(2) {
                prop_assert!(pair[0].final_score + SCORE_TIE_TOLERANCE >= pair[1].final_score);
            }
        }

        #[test]
        fn prop_ranking_is_deterministic(households in collection()) {
            let engine = RankingEngine::default();
            let first = engine.rank(&households).unwrap();
            let second = engine.rank(&households).unwrap();
            prop_assert_eq!(first, second);

            let mut reversed = households.clone();
            reversed.reverse();
            let mut from_reversed = engine.rank(&reversed).unwrap();
            from_reversed.sort_by_key(|r| r.rank);
            let order: Vec<_> = engine.rank(&households).unwrap()
                .into_iter().map(|r| r.household_id).collect();
            let reversed_order: Vec<_> = from_reversed.into_iter().map(|r| r.household_id).collect();
            prop_assert_eq!(order, reversed_order);
        }
    }
}
