//! Ranking policy: which way each criterion points and how much it weighs.
//!
//! A policy file is JSON:
//!
//! ```json
//! {
//!   "weights": { "income": 0.3, "age_of_head": 0.1, "dependents": 0.2,
//!                "health_condition": 0.1, "housing_condition": 0.15,
//!                "asset_ownership": 0.15 },
//!   "polarity": { "age_of_head": "cost" }
//! }
//! ```
//!
//! `polarity` is optional and only overrides the listed criteria.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::criteria::{Criterion, Polarity};
use crate::error::RankingError;
use crate::weights::WeightVector;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("unable to read policy file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("policy file is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Ranking(#[from] RankingError),
}

/// Polarity of every criterion; always complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolarityProfile {
    polarity: BTreeMap<Criterion, Polarity>,
}

impl PolarityProfile {
    pub fn get(&self, criterion: Criterion) -> Polarity {
        self.polarity
            .get(&criterion)
            .copied()
            .unwrap_or_else(|| default_polarity(criterion))
    }

    pub fn with(mut self, criterion: Criterion, polarity: Polarity) -> Self {
        self.polarity.insert(criterion, polarity);
        self
    }
}

impl Default for PolarityProfile {
    fn default() -> Self {
        Self {
            polarity: Criterion::ALL
                .into_iter()
                .map(|criterion| (criterion, default_polarity(criterion)))
                .collect(),
        }
    }
}

/// Lower income and better conditions (rank 1) score higher; older heads of
/// household and more dependents score higher.
fn default_polarity(criterion: Criterion) -> Polarity {
    match criterion {
        Criterion::Income => Polarity::Cost,
        Criterion::AgeOfHead | Criterion::Dependents => Polarity::Benefit,
        Criterion::HealthCondition | Criterion::HousingCondition | Criterion::AssetOwnership => {
            Polarity::Cost
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingPolicy {
    pub weights: WeightVector,
    pub polarity: PolarityProfile,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    weights: BTreeMap<String, f64>,
    #[serde(default)]
    polarity: BTreeMap<String, Polarity>,
}

impl RankingPolicy {
    pub fn new(weights: WeightVector, polarity: PolarityProfile) -> Self {
        Self { weights, polarity }
    }

    pub fn from_json_str(input: &str) -> Result<Self, PolicyError> {
        let file: PolicyFile = serde_json::from_str(input)?;
        let weights =
            WeightVector::from_named(file.weights.iter().map(|(name, w)| (name.as_str(), *w)))?;

        let mut polarity = PolarityProfile::default();
        for (name, direction) in &file.polarity {
            let criterion = Criterion::from_name(name).ok_or_else(|| {
                RankingError::WeightMismatch(format!("unknown criterion '{name}' in polarity"))
            })?;
            polarity = polarity.with(criterion, *direction);
        }

        Ok(Self::new(weights, polarity))
    }

    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let input = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let policy = Self::from_json_str(&input)?;
        tracing::debug!(path = %path.display(), "loaded ranking policy");
        Ok(policy)
    }
}
