use std::{fmt::Display, sync::Arc};

use serde::Serialize;

use crate::{
    error::InsertionError,
    params::{InsertionParams, StrategyKind},
    problem::job::JobIdx,
    solution::route::VehicleRoute,
};

use super::{
    best_insertion::BestInsertion,
    best_insertion_concurrent::BestInsertionConcurrent,
    recreate_context::RecreateContext,
    regret_insertion::RegretInsertion,
    regret_insertion_fast::FastRegretInsertion,
    scoring::ScoringFunction,
};

pub enum RecreateStrategy {
    BestInsertion(BestInsertion),
    BestInsertionConcurrent(BestInsertionConcurrent),
    RegretInsertion(RegretInsertion),
    FastRegretInsertion(FastRegretInsertion),
}

impl RecreateStrategy {
    pub fn from_params(params: &InsertionParams, scorer: Arc<dyn ScoringFunction>) -> Self {
        let num_threads = params.threads.number_of_threads();
        match params.strategy {
            StrategyKind::BestInsertion if num_threads > 1 => {
                RecreateStrategy::BestInsertionConcurrent(BestInsertionConcurrent::new(num_threads))
            }
            StrategyKind::BestInsertion => RecreateStrategy::BestInsertion(BestInsertion),
            StrategyKind::RegretInsertion if params.fast_regret => {
                RecreateStrategy::FastRegretInsertion(FastRegretInsertion::new(scorer))
            }
            StrategyKind::RegretInsertion => {
                RecreateStrategy::RegretInsertion(RegretInsertion::new(scorer))
            }
        }
    }

    /// Inserts as many of `unassigned_jobs` as possible and returns the ones that fit nowhere.
    pub fn insert_unassigned_jobs(
        &self,
        routes: &mut Vec<VehicleRoute>,
        unassigned_jobs: &[JobIdx],
        context: &mut RecreateContext,
    ) -> Result<Vec<JobIdx>, InsertionError> {
        match self {
            RecreateStrategy::BestInsertion(strategy) => {
                strategy.insert_unassigned_jobs(routes, unassigned_jobs, context)
            }
            RecreateStrategy::BestInsertionConcurrent(strategy) => {
                strategy.insert_unassigned_jobs(routes, unassigned_jobs, context)
            }
            RecreateStrategy::RegretInsertion(strategy) => {
                strategy.insert_unassigned_jobs(routes, unassigned_jobs, context)
            }
            RecreateStrategy::FastRegretInsertion(strategy) => {
                strategy.insert_unassigned_jobs(routes, unassigned_jobs, context)
            }
        }
    }
}

impl Serialize for RecreateStrategy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Display for RecreateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BestInsertion(_) => write!(f, "BestInsertion"),
            Self::BestInsertionConcurrent(strategy) => {
                write!(f, "BestInsertionConcurrent({})", strategy.num_batches())
            }
            Self::RegretInsertion(_) => write!(f, "RegretInsertion"),
            Self::FastRegretInsertion(_) => write!(f, "FastRegretInsertion"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{params::Threads, recreate::scoring::DefaultScorer};

    use super::*;

    fn strategy(params: &InsertionParams) -> RecreateStrategy {
        RecreateStrategy::from_params(params, Arc::new(DefaultScorer::default()))
    }

    #[test]
    fn test_strategy_follows_params() {
        let mut params = InsertionParams::default();
        assert_eq!(strategy(&params).to_string(), "FastRegretInsertion");

        params.fast_regret = false;
        assert_eq!(strategy(&params).to_string(), "RegretInsertion");

        params.strategy = StrategyKind::BestInsertion;
        assert_eq!(strategy(&params).to_string(), "BestInsertion");

        params.threads = Threads::Multi(4);
        assert_eq!(strategy(&params).to_string(), "BestInsertionConcurrent(4)");
        assert_eq!(
            serde_json::to_string(&strategy(&params)).unwrap(),
            r#""BestInsertionConcurrent(4)""#
        );
    }
}
