use std::collections::BTreeMap;

use serde::Serialize;

use crate::criteria::Criterion;
use crate::error::RankingError;

/// Accepted distance between the weight sum and 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Per-criterion weights. May hold any subset of criteria; completeness and
/// the unit sum are checked against the matrix at aggregation time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightVector {
    weights: BTreeMap<Criterion, f64>,
}

impl WeightVector {
    pub fn new(weights: BTreeMap<Criterion, f64>) -> Self {
        Self { weights }
    }

    /// Builds a vector from criterion names, rejecting names outside the catalogue.
    pub fn from_named<'a, I>(entries: I) -> Result<Self, RankingError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut weights = BTreeMap::new();
        for (name, weight) in entries {
            let criterion = Criterion::from_name(name).ok_or_else(|| {
                RankingError::WeightMismatch(format!("unknown criterion '{name}'"))
            })?;
            weights.insert(criterion, weight);
        }
        Ok(Self { weights })
    }

    pub fn get(&self, criterion: Criterion) -> Option<f64> {
        self.weights.get(&criterion).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        self.weights.iter().map(|(criterion, weight)| (*criterion, *weight))
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Checks the criterion set against `columns` and every weight for sign.
    pub fn check_shape(&self, columns: &[Criterion]) -> Result<(), RankingError> {
        for criterion in columns {
            if !self.weights.contains_key(criterion) {
                return Err(RankingError::WeightMismatch(format!(
                    "missing weight for {criterion}"
                )));
            }
        }
        if let Some(extra) = self.weights.keys().find(|c| !columns.contains(c)) {
            return Err(RankingError::WeightMismatch(format!(
                "unexpected weight for {extra}"
            )));
        }
        if let Some((criterion, weight)) = self
            .iter()
            .find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
        {
            return Err(RankingError::WeightMismatch(format!(
                "weight for {criterion} must be a non-negative number, got {weight}"
            )));
        }
        Ok(())
    }

    /// Fails unless the weights sum to 1.0 within [`WEIGHT_SUM_TOLERANCE`].
    pub fn check_unit_sum(&self) -> Result<(), RankingError> {
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RankingError::WeightMismatch(format!(
                "weights sum to {sum}, expected 1.0"
            )));
        }
        Ok(())
    }

    /// Rescales the weights to sum to 1.0.
    pub fn normalized(&self) -> Result<Self, RankingError> {
        let sum = self.sum();
        if !sum.is_finite() || sum <= 0.0 {
            return Err(RankingError::WeightMismatch(format!(
                "weights sum to {sum}, cannot rescale"
            )));
        }
        Ok(Self {
            weights: self
                .weights
                .iter()
                .map(|(criterion, weight)| (*criterion, weight / sum))
                .collect(),
        })
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::new(BTreeMap::from([
            (Criterion::Income, 0.25),
            (Criterion::AgeOfHead, 0.10),
            (Criterion::Dependents, 0.20),
            (Criterion::HealthCondition, 0.15),
            (Criterion::HousingCondition, 0.15),
            (Criterion::AssetOwnership, 0.15),
        ]))
    }
}
