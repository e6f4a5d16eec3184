use serde::{Deserialize, Serialize};

use crate::error::InsertionError;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    BestInsertion,
    #[default]
    RegretInsertion,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Threads {
    #[default]
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// How the cost of placing an activity in a gap is estimated.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsertionLevel {
    #[default]
    Local,
    RouteLevel {
        forward_looking: usize,
        memory: usize,
    },
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseParams {
    pub probability: f64,
    pub level: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        NoiseParams {
            probability: 0.0,
            level: 0.0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringParams {
    pub time_window_param: f64,
    pub depot_distance_param: f64,
    pub min_time_window_score: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        ScoringParams {
            time_window_param: -0.5,
            depot_distance_param: 0.1,
            min_time_window_score: -100000.0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InsertionParams {
    pub strategy: StrategyKind,
    pub threads: Threads,
    pub level: InsertionLevel,
    pub fast_regret: bool,
    pub consider_fixed_costs: bool,
    pub fixed_cost_weight: f64,
    pub allow_vehicle_switch: bool,
    pub activity_cost_weight: f64,
    pub noise: NoiseParams,
    pub scoring: ScoringParams,
    pub seed: Option<u64>,
}

impl Default for InsertionParams {
    fn default() -> Self {
        InsertionParams {
            strategy: StrategyKind::RegretInsertion,
            threads: Threads::Single,
            level: InsertionLevel::Local,
            fast_regret: true,
            consider_fixed_costs: false,
            fixed_cost_weight: 0.5,
            allow_vehicle_switch: true,
            activity_cost_weight: 1.0,
            noise: NoiseParams::default(),
            scoring: ScoringParams::default(),
            seed: None,
        }
    }
}

impl InsertionParams {
    pub fn from_json_str(json: &str) -> Result<Self, InsertionError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let params = InsertionParams::from_json_str(
            r#"{ "strategy": "best_insertion", "threads": { "multi": 4 }, "seed": 7 }"#,
        )
        .unwrap();

        assert_eq!(params.strategy, StrategyKind::BestInsertion);
        assert_eq!(params.threads.number_of_threads(), 4);
        assert_eq!(params.seed, Some(7));
        assert_eq!(params.level, InsertionLevel::Local);
        assert!(params.fast_regret);
        assert_eq!(params.fixed_cost_weight, 0.5);
        assert_eq!(params.scoring, ScoringParams::default());
    }

    #[test]
    fn test_route_level() {
        let params = InsertionParams::from_json_str(
            r#"{ "level": { "route_level": { "forward_looking": 3, "memory": 2 } } }"#,
        )
        .unwrap();

        assert_eq!(
            params.level,
            InsertionLevel::RouteLevel {
                forward_looking: 3,
                memory: 2
            }
        );
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = InsertionParams::from_json_str(r#"{ "strategy": "best_insertion", "foo": 1 }"#);
        assert!(matches!(result, Err(InsertionError::InvalidParams(_))));
    }
}
