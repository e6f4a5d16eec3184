use std::sync::{Arc, atomic::AtomicBool};

use rand::{SeedableRng, rngs::SmallRng};
use tracing::{Level, info, instrument};

use crate::{
    constraints::constraint_manager::ConstraintManager,
    error::InsertionError,
    fleet_manager::{FleetLockingListener, FleetManager, create_fleet_manager},
    insertion::{
        calculator_builder::CalculatorBuilder,
        vehicle_type_dependent::VehicleTypeDependentCalculator,
    },
    params::InsertionParams,
    problem::{job::JobIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solution::route::VehicleRoute,
    state::state_updater::StateUpdater,
};

use super::{
    inserter::Inserter,
    listeners::{InsertionListener, InsertionListeners},
    noise::NoiseGenerator,
    recreate_context::RecreateContext,
    recreate_strategy::RecreateStrategy,
    scoring::{DefaultScorer, ScoringFunction},
};

/// Entry point of the crate: inserts unassigned jobs into a set of routes with the strategy
/// selected by [`InsertionParams`].
pub struct InsertionStrategy {
    problem: Arc<VehicleRoutingProblem>,
    strategy: RecreateStrategy,
    calculator: VehicleTypeDependentCalculator,
    inserter: Inserter,
    rng: SmallRng,
    noise_generator: Option<NoiseGenerator>,
    thread_pool: Option<rayon::ThreadPool>,
    cancellation: Option<Arc<AtomicBool>>,
}

impl InsertionStrategy {
    pub fn strategy(&self) -> &RecreateStrategy {
        &self.strategy
    }

    /// Inserts `unassigned_jobs` into `routes`, opening new routes as needed. Returns the
    /// jobs that could not be inserted anywhere.
    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn insert_jobs(
        &mut self,
        routes: &mut Vec<VehicleRoute>,
        unassigned_jobs: &[JobIdx],
    ) -> Result<Vec<JobIdx>, InsertionError> {
        self.inserter
            .listeners()
            .insertion_starts(routes, unassigned_jobs);

        let mut context = RecreateContext {
            problem: &self.problem,
            calculator: &self.calculator,
            inserter: &self.inserter,
            rng: &mut self.rng,
            noise_generator: self.noise_generator.as_ref(),
            thread_pool: self.thread_pool.as_ref(),
            cancellation: self.cancellation.as_deref(),
        };
        let bad_jobs = self
            .strategy
            .insert_unassigned_jobs(routes, unassigned_jobs, &mut context)?;

        self.inserter.listeners().insertion_ends(routes, &bad_jobs);
        Ok(bad_jobs)
    }
}

#[derive(Default)]
pub struct InsertionStrategyBuilder {
    params: InsertionParams,
    problem: Option<Arc<VehicleRoutingProblem>>,
    constraints: Option<Arc<ConstraintManager>>,
    fleet_manager: Option<Arc<dyn FleetManager>>,
    scorer: Option<Arc<dyn ScoringFunction>>,
    listeners: Vec<Arc<dyn InsertionListener>>,
    cancellation: Option<Arc<AtomicBool>>,
}

impl InsertionStrategyBuilder {
    pub fn set_params(&mut self, params: InsertionParams) -> &mut InsertionStrategyBuilder {
        self.params = params;
        self
    }

    pub fn set_problem(&mut self, problem: Arc<VehicleRoutingProblem>) -> &mut InsertionStrategyBuilder {
        self.problem = Some(problem);
        self
    }

    pub fn set_constraints(&mut self, constraints: Arc<ConstraintManager>) -> &mut InsertionStrategyBuilder {
        self.constraints = Some(constraints);
        self
    }

    pub fn set_fleet_manager(
        &mut self,
        fleet_manager: Arc<dyn FleetManager>,
    ) -> &mut InsertionStrategyBuilder {
        self.fleet_manager = Some(fleet_manager);
        self
    }

    pub fn set_scorer(&mut self, scorer: Arc<dyn ScoringFunction>) -> &mut InsertionStrategyBuilder {
        self.scorer = Some(scorer);
        self
    }

    /// Listeners run after the built-in state and fleet listeners.
    pub fn add_listener(&mut self, listener: Arc<dyn InsertionListener>) -> &mut InsertionStrategyBuilder {
        self.listeners.push(listener);
        self
    }

    pub fn set_cancellation(&mut self, cancellation: Arc<AtomicBool>) -> &mut InsertionStrategyBuilder {
        self.cancellation = Some(cancellation);
        self
    }

    pub fn build(self) -> Result<InsertionStrategy, InsertionError> {
        let params = self.params;
        let problem = self
            .problem
            .ok_or(InsertionError::MissingConfiguration("problem"))?;
        let constraints = self
            .constraints
            .unwrap_or_else(|| Arc::new(ConstraintManager::with_defaults()));
        let fleet_manager = self
            .fleet_manager
            .unwrap_or_else(|| create_fleet_manager(&problem));

        let mut calculator = CalculatorBuilder::default();
        calculator
            .set_problem(Arc::clone(&problem))
            .set_constraints(constraints)
            .set_fleet_manager(Arc::clone(&fleet_manager))
            .set_level(params.level)
            .set_activity_cost_weight(params.activity_cost_weight)
            .set_allow_vehicle_switch(params.allow_vehicle_switch);
        if params.consider_fixed_costs {
            calculator.consider_fixed_costs(params.fixed_cost_weight);
        }
        let calculator = calculator.build()?;

        let mut listeners = InsertionListeners::default();
        listeners.add(Arc::new(StateUpdater::new(Arc::clone(&problem))));
        listeners.add(Arc::new(FleetLockingListener::new(fleet_manager)));
        for listener in self.listeners {
            listeners.add(listener);
        }
        let inserter = Inserter::new(Arc::clone(&problem), listeners);

        let num_threads = params.threads.number_of_threads();
        let thread_pool = if num_threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .thread_name(|index| format!("insertion-{index}"))
                    .build()?,
            )
        } else {
            None
        };

        let mut rng = match params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        let noise_generator = (params.noise.probability > 0.0).then(|| {
            NoiseGenerator::new(
                problem.num_jobs(),
                problem.max_cost(),
                params.noise.probability,
                params.noise.level,
                &mut rng,
            )
        });

        let scorer = self
            .scorer
            .unwrap_or_else(|| Arc::new(DefaultScorer::new(params.scoring)));
        let strategy = RecreateStrategy::from_params(&params, scorer);

        info!(
            strategy = %strategy,
            threads = num_threads,
            level = ?params.level,
            "insertion strategy ready"
        );

        Ok(InsertionStrategy {
            problem,
            strategy,
            calculator,
            inserter,
            rng,
            noise_generator,
            thread_pool,
            cancellation: self.cancellation,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use parking_lot::Mutex;

    use crate::{
        params::{InsertionLevel, StrategyKind, Threads},
        problem::{
            amount::Amount, time_window::TimeWindow, vehicle::VehicleTypeBuilder,
            vehicle_routing_problem::VehicleRoutingProblemBuilder,
        },
        test_utils::{
            assert_route_feasible, create_basic_vehicles, create_locations,
            create_scenario_a_problem, create_service, create_shipment,
            create_test_problem_with_shipments,
        },
    };

    use super::*;

    #[derive(Default)]
    struct Lifecycle(Mutex<Vec<String>>);

    impl InsertionListener for Lifecycle {
        fn insertion_starts(&self, _routes: &mut [VehicleRoute], unassigned_jobs: &[JobIdx]) {
            self.0
                .lock()
                .push(format!("starts {}", unassigned_jobs.len()));
        }

        fn insertion_ends(&self, _routes: &mut [VehicleRoute], bad_jobs: &[JobIdx]) {
            self.0.lock().push(format!("ends {}", bad_jobs.len()));
        }
    }

    fn build(problem: Arc<VehicleRoutingProblem>, params: InsertionParams) -> InsertionStrategy {
        let mut builder = InsertionStrategyBuilder::default();
        builder.set_problem(problem).set_params(params);
        builder.build().unwrap()
    }

    #[test]
    fn test_every_strategy_solves_scenario_a() {
        let problem = create_scenario_a_problem(true);
        let kinds = [
            (StrategyKind::BestInsertion, Threads::Single, false),
            (StrategyKind::BestInsertion, Threads::Multi(2), false),
            (StrategyKind::RegretInsertion, Threads::Single, false),
            (StrategyKind::RegretInsertion, Threads::Single, true),
            (StrategyKind::RegretInsertion, Threads::Multi(2), true),
        ];

        for (strategy, threads, fast_regret) in kinds {
            let params = InsertionParams {
                strategy,
                threads,
                fast_regret,
                seed: Some(3),
                ..InsertionParams::default()
            };
            let mut insertion = build(Arc::clone(&problem), params);

            let mut routes = Vec::new();
            let jobs: Vec<JobIdx> = problem.job_ids().collect();
            let bad_jobs = insertion.insert_jobs(&mut routes, &jobs).unwrap();

            assert!(bad_jobs.is_empty(), "{}", insertion.strategy());
            assert_eq!(routes.iter().map(VehicleRoute::len).sum::<usize>(), 4);
            for route in &routes {
                assert_route_feasible(&problem, route);
            }
        }
    }

    #[test]
    fn test_listeners_see_start_and_end() {
        let problem = create_scenario_a_problem(false);
        let lifecycle = Arc::new(Lifecycle::default());
        let mut builder = InsertionStrategyBuilder::default();
        builder
            .set_problem(Arc::clone(&problem))
            .add_listener(lifecycle.clone());
        let mut insertion = builder.build().unwrap();

        let mut routes = Vec::new();
        let jobs: Vec<JobIdx> = problem.job_ids().collect();
        let bad_jobs = insertion.insert_jobs(&mut routes, &jobs).unwrap();

        assert_eq!(bad_jobs.len(), 2);
        assert_eq!(
            *lifecycle.0.lock(),
            vec![String::from("starts 4"), String::from("ends 2")]
        );
    }

    #[test]
    fn test_fleet_is_released_between_calls() {
        let problem = create_scenario_a_problem(false);
        let mut insertion = build(Arc::clone(&problem), InsertionParams::default());
        let jobs: Vec<JobIdx> = problem.job_ids().collect();

        let mut first = Vec::new();
        insertion.insert_jobs(&mut first, &jobs).unwrap();
        let mut second = Vec::new();
        let bad_jobs = insertion.insert_jobs(&mut second, &jobs).unwrap();

        assert_eq!(second.len(), 1);
        assert_eq!(bad_jobs.len(), 2);
    }

    #[test]
    fn test_cancelled_before_first_round() {
        let problem = create_scenario_a_problem(true);
        let cancellation = Arc::new(AtomicBool::new(false));
        let mut builder = InsertionStrategyBuilder::default();
        builder
            .set_problem(Arc::clone(&problem))
            .set_cancellation(Arc::clone(&cancellation));
        let mut insertion = builder.build().unwrap();
        cancellation.store(true, Ordering::Relaxed);

        let mut routes = Vec::new();
        let jobs: Vec<JobIdx> = problem.job_ids().collect();
        let result = insertion.insert_jobs(&mut routes, &jobs);

        assert!(matches!(result, Err(InsertionError::Cancelled)));
        assert!(routes.is_empty());
    }

    #[test]
    fn test_missing_problem_is_a_configuration_error() {
        let result = InsertionStrategyBuilder::default().build();
        assert!(matches!(
            result,
            Err(InsertionError::MissingConfiguration("problem"))
        ));
    }

    #[test]
    fn test_route_level_with_shipments_is_rejected() {
        let problem = Arc::new(create_test_problem_with_shipments(vec![create_shipment(
            "s", 1, 2, 1.0,
        )]));
        let params = InsertionParams {
            level: InsertionLevel::RouteLevel {
                forward_looking: 2,
                memory: 1,
            },
            ..InsertionParams::default()
        };
        let mut builder = InsertionStrategyBuilder::default();
        builder.set_problem(problem).set_params(params);

        assert!(matches!(
            builder.build(),
            Err(InsertionError::RouteLevelWithShipments)
        ));
    }

    #[test]
    fn test_shipments_are_inserted_pickup_first() {
        let problem = Arc::new(create_test_problem_with_shipments(vec![
            create_shipment("a", 1, 3, 4.0),
            create_shipment("b", 2, 4, 4.0),
        ]));
        let mut insertion = build(
            Arc::clone(&problem),
            InsertionParams {
                seed: Some(1),
                ..InsertionParams::default()
            },
        );

        let mut routes = Vec::new();
        let jobs: Vec<JobIdx> = problem.job_ids().collect();
        let bad_jobs = insertion.insert_jobs(&mut routes, &jobs).unwrap();

        assert!(bad_jobs.is_empty());
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].len(), 4);
        assert_route_feasible(&problem, &routes[0]);
    }

    #[test]
    fn test_penalty_vehicles_take_overflow() {
        let mut vehicle_type = VehicleTypeBuilder::default();
        vehicle_type.set_capacity(Amount::from_vec(vec![2.0]));
        let services = (1..=4)
            .map(|location_id| {
                create_service(
                    &format!("s{location_id}"),
                    location_id,
                    1.0,
                    TimeWindow::default(),
                )
            })
            .collect();

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_locations(create_locations(vec![
                (10.0, 10.0),
                (5.0, 7.0),
                (5.0, 13.0),
                (15.0, 7.0),
                (15.0, 13.0),
            ]))
            .set_services(services)
            .set_vehicle_types(vec![vehicle_type.build()])
            .set_vehicles(create_basic_vehicles(vec![0]))
            .set_penalty_vehicles(10.0);
        let problem = Arc::new(builder.build());

        let mut insertion = build(Arc::clone(&problem), InsertionParams::default());
        let mut routes = Vec::new();
        let jobs: Vec<JobIdx> = problem.job_ids().collect();
        let bad_jobs = insertion.insert_jobs(&mut routes, &jobs).unwrap();

        assert!(bad_jobs.is_empty());
        assert_eq!(routes.len(), 2);
        assert!(routes.iter().all(|route| route.len() == 2));
    }
}
