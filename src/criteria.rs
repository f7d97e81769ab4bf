//! The closed catalogue of scoring criteria and their ordinal scales.
//!
//! Categorical criteria are five-level enumerations with a fixed rank
//! (1 = best condition, 5 = worst). Labels are matched exactly; anything
//! outside the enumeration is rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RankingError;

/// Lowest and highest rank of every ordinal scale.
pub const ORDINAL_MIN_RANK: u8 = 1;
pub const ORDINAL_MAX_RANK: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Income,
    AgeOfHead,
    Dependents,
    HealthCondition,
    HousingCondition,
    AssetOwnership,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionKind {
    /// Bounds come from the household collection.
    Numeric,
    /// Bounds are the fixed 1..=5 rank scale.
    Ordinal,
}

impl Criterion {
    /// Column order used by the normalized matrix and every report.
    pub const ALL: [Criterion; 6] = [
        Criterion::Income,
        Criterion::AgeOfHead,
        Criterion::Dependents,
        Criterion::HealthCondition,
        Criterion::HousingCondition,
        Criterion::AssetOwnership,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Criterion::Income => "income",
            Criterion::AgeOfHead => "age_of_head",
            Criterion::Dependents => "dependents",
            Criterion::HealthCondition => "health_condition",
            Criterion::HousingCondition => "housing_condition",
            Criterion::AssetOwnership => "asset_ownership",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|criterion| criterion.name() == name)
    }

    pub fn kind(self) -> CriterionKind {
        match self {
            Criterion::Income | Criterion::AgeOfHead | Criterion::Dependents => {
                CriterionKind::Numeric
            }
            Criterion::HealthCondition
            | Criterion::HousingCondition
            | Criterion::AssetOwnership => CriterionKind::Ordinal,
        }
    }

    /// Position of this criterion in [`Criterion::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of preference for a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Higher raw values yield higher utility.
    Benefit,
    /// Lower raw values yield higher utility.
    Cost,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Benefit => f.write_str("benefit"),
            Polarity::Cost => f.write_str("cost"),
        }
    }
}

/// A five-level ordinal scale with canonical labels.
pub trait OrdinalScale: Sized + Copy + 'static {
    const CRITERION: Criterion;
    /// Levels ordered from rank 1 to rank 5.
    const LEVELS: [Self; 5];

    fn label(self) -> &'static str;

    fn rank(self) -> u8;

    fn from_label(label: &str) -> Option<Self> {
        Self::LEVELS.into_iter().find(|level| level.label() == label)
    }

    /// Parses a stored label, attributing failures to `household_id`.
    fn parse_for(household_id: &str, label: &str) -> Result<Self, RankingError> {
        Self::from_label(label).ok_or_else(|| RankingError::UnknownCategory {
            household_id: household_id.to_string(),
            criterion: Self::CRITERION,
            label: label.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCondition {
    Healthy = 1,
    MinorIllness = 2,
    ChronicIllness = 3,
    Disability = 4,
    ChronicIllnessWithDisability = 5,
}

impl OrdinalScale for HealthCondition {
    const CRITERION: Criterion = Criterion::HealthCondition;
    const LEVELS: [Self; 5] = [
        HealthCondition::Healthy,
        HealthCondition::MinorIllness,
        HealthCondition::ChronicIllness,
        HealthCondition::Disability,
        HealthCondition::ChronicIllnessWithDisability,
    ];

    fn label(self) -> &'static str {
        match self {
            HealthCondition::Healthy => "healthy",
            HealthCondition::MinorIllness => "minor_illness",
            HealthCondition::ChronicIllness => "chronic_illness",
            HealthCondition::Disability => "disability",
            HealthCondition::ChronicIllnessWithDisability => "chronic_illness_with_disability",
        }
    }

    fn rank(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingCondition {
    PermanentAdequate = 1,
    PermanentMinorDamage = 2,
    SemiPermanent = 3,
    NonPermanent = 4,
    Uninhabitable = 5,
}

impl OrdinalScale for HousingCondition {
    const CRITERION: Criterion = Criterion::HousingCondition;
    const LEVELS: [Self; 5] = [
        HousingCondition::PermanentAdequate,
        HousingCondition::PermanentMinorDamage,
        HousingCondition::SemiPermanent,
        HousingCondition::NonPermanent,
        HousingCondition::Uninhabitable,
    ];

    fn label(self) -> &'static str {
        match self {
            HousingCondition::PermanentAdequate => "permanent_adequate",
            HousingCondition::PermanentMinorDamage => "permanent_minor_damage",
            HousingCondition::SemiPermanent => "semi_permanent",
            HousingCondition::NonPermanent => "non_permanent",
            HousingCondition::Uninhabitable => "uninhabitable",
        }
    }

    fn rank(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetOwnership {
    LargeAssets = 1,
    ModerateAssets = 2,
    SmallAssets = 3,
    MinimalAssets = 4,
    NoAssets = 5,
}

impl OrdinalScale for AssetOwnership {
    const CRITERION: Criterion = Criterion::AssetOwnership;
    const LEVELS: [Self; 5] = [
        AssetOwnership::LargeAssets,
        AssetOwnership::ModerateAssets,
        AssetOwnership::SmallAssets,
        AssetOwnership::MinimalAssets,
        AssetOwnership::NoAssets,
    ];

    fn label(self) -> &'static str {
        match self {
            AssetOwnership::LargeAssets => "large_assets",
            AssetOwnership::ModerateAssets => "moderate_assets",
            AssetOwnership::SmallAssets => "small_assets",
            AssetOwnership::MinimalAssets => "minimal_assets",
            AssetOwnership::NoAssets => "no_assets",
        }
    }

    fn rank(self) -> u8 {
        self as u8
    }
}
