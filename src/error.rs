use crate::criteria::Criterion;

/// Failures raised by the ranking engine. Every variant aborts the whole batch;
/// the engine never publishes a partial ranking.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankingError {
    #[error("cannot rank an empty household collection")]
    EmptyInputSet,
    #[error("household {household_id}: '{label}' is not a known {criterion} category")]
    UnknownCategory {
        household_id: String,
        criterion: Criterion,
        label: String,
    },
    #[error("weight vector does not match the criteria: {0}")]
    WeightMismatch(String),
    #[error("household {household_id}: {criterion} value {value} is outside the accepted range")]
    InvalidValue {
        household_id: String,
        criterion: Criterion,
        value: i64,
    },
    #[error("household id {0} appears more than once")]
    DuplicateHousehold(String),
    #[error("household {household_id}: {criterion} cost utility divides by zero")]
    DivisionByZero {
        household_id: String,
        criterion: Criterion,
    },
}
