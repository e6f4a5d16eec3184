use std::{cmp::Ordering, collections::BinaryHeap, sync::Arc};

use smallvec::SmallVec;
use tracing::{Level, debug, instrument, warn};

use crate::{
    error::InsertionError,
    fleet_manager::FleetManager,
    insertion::{
        insertion_context::{CandidateVehicle, SolutionProgress},
        insertion_data::{Event, InsertionData},
        job_insertion_calculator::JobInsertionCostsCalculator,
        vehicle_type_dependent::VehicleTypeDependentCalculator,
    },
    problem::{job::JobIdx, vehicle::VehicleIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solution::route::{RouteIdx, VehicleRoute},
};

use super::{
    parallel::evaluate_in_parallel,
    recreate_context::{BestTwo, RecreateContext, RouteTarget},
    regret_insertion::{ScoredJob, insert_break, score_job, select_winner},
    scoring::{DefaultScorer, ScoringFunction},
};

/// Insertion of a job into a route for one vehicle, valid while the route is at `version`.
#[derive(Debug, Clone)]
pub struct VersionedInsertionData {
    pub data: InsertionData,
    pub route_id: RouteIdx,
    pub version: u64,
    rank: usize,
}

impl VersionedInsertionData {
    fn key(&self) -> (f64, RouteIdx, usize) {
        (self.data.cost, self.route_id, self.rank)
    }
}

impl PartialEq for VersionedInsertionData {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionedInsertionData {}

impl PartialOrd for VersionedInsertionData {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionedInsertionData {
    // reversed so that `BinaryHeap` pops the cheapest entry first
    fn cmp(&self, other: &Self) -> Ordering {
        let (cost, route_id, rank) = self.key();
        let (other_cost, other_route_id, other_rank) = other.key();
        other_cost
            .total_cmp(&cost)
            .then_with(|| other_route_id.cmp(&route_id))
            .then_with(|| other_rank.cmp(&rank))
    }
}

/// Evaluates `job_id` against `route_ids` for every vehicle the route could use.
fn evaluate_job(
    problem: &VehicleRoutingProblem,
    calculator: &VehicleTypeDependentCalculator,
    routes: &[VehicleRoute],
    route_ids: &[RouteIdx],
    versions: &[u64],
    job_id: JobIdx,
    progress: SolutionProgress,
) -> Vec<VersionedInsertionData> {
    let mut entries = Vec::new();

    for &route_id in route_ids {
        let route = &routes[route_id];
        for (rank, vehicle_id) in calculator.relevant_vehicles(route).into_iter().enumerate() {
            let departure_time = if route.vehicle_id() == Some(vehicle_id) {
                route.departure_time()
            } else {
                problem.vehicle(vehicle_id).earliest_departure()
            };
            let candidate = CandidateVehicle::new(vehicle_id, route.driver(), departure_time);

            let data = calculator.insertion_data(route, job_id, &candidate, f64::MAX, progress);
            if !data.is_no_insertion_found() {
                entries.push(VersionedInsertionData {
                    data,
                    route_id,
                    version: versions[route_id.get()],
                    rank,
                });
            }
        }
    }

    entries
}

fn with_vehicle(mut data: InsertionData, vehicle_id: VehicleIdx) -> InsertionData {
    data.vehicle_id = Some(vehicle_id);
    for event in &mut data.events {
        match event {
            Event::InsertActivity { vehicle_id: id, .. }
            | Event::InsertBreak { vehicle_id: id, .. }
            | Event::SwitchVehicle { vehicle_id: id, .. } => *id = vehicle_id,
        }
    }
    data
}

/// Insertion an entry stands for given the current fleet. A locked vehicle other than the
/// route's own is replaced by an available vehicle of the same type, if there is one.
fn usable_data(
    entry: &VersionedInsertionData,
    route: &VehicleRoute,
    fleet_manager: &dyn FleetManager,
) -> Option<InsertionData> {
    let vehicle_id = entry.data.vehicle_id?;
    if route.vehicle_id() == Some(vehicle_id) || !fleet_manager.is_locked(vehicle_id) {
        return Some(entry.data.clone());
    }

    let substitute = fleet_manager.available_vehicle_of_type(fleet_manager.type_key(vehicle_id))?;
    Some(with_vehicle(entry.data.clone(), substitute))
}

/// Reads the best and second best insertion of a job over the existing routes from its
/// cache. Entries computed against an older version of their route are dropped, every
/// other entry stays cached.
pub(crate) fn best_two_from_cache(
    cache: &mut BinaryHeap<VersionedInsertionData>,
    routes: &[VehicleRoute],
    versions: &[u64],
    fleet_manager: &dyn FleetManager,
) -> BestTwo {
    let mut best_two = BestTwo::default();
    let mut best_route = None;
    let mut kept = Vec::new();

    while let Some(entry) = cache.pop() {
        if entry.version != versions[entry.route_id.get()] {
            continue;
        }
        if best_route == Some(entry.route_id) {
            kept.push(entry);
            continue;
        }

        let route = &routes[entry.route_id];
        let Some(data) = usable_data(&entry, route, fleet_manager) else {
            warn!(
                route = %entry.route_id,
                vehicle = ?entry.data.vehicle_id,
                "cached vehicle is locked and has no substitute, skipping entry"
            );
            kept.push(entry);
            continue;
        };

        let route_id = entry.route_id;
        kept.push(entry);
        best_two.offer(RouteTarget::Existing(route_id), data);
        if best_route.is_some() {
            break;
        }
        best_route = Some(route_id);
    }

    cache.extend(kept);
    best_two
}

/// Regret insertion that caches every job's insertions per route and only re-evaluates the
/// routes changed by the previous round.
pub struct FastRegretInsertion {
    scorer: Arc<dyn ScoringFunction>,
}

impl Default for FastRegretInsertion {
    fn default() -> Self {
        FastRegretInsertion::new(Arc::new(DefaultScorer::default()))
    }
}

impl FastRegretInsertion {
    pub fn new(scorer: Arc<dyn ScoringFunction>) -> Self {
        FastRegretInsertion { scorer }
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn insert_unassigned_jobs(
        &self,
        routes: &mut Vec<VehicleRoute>,
        unassigned_jobs: &[JobIdx],
        context: &mut RecreateContext,
    ) -> Result<Vec<JobIdx>, InsertionError> {
        let (breaks, mut jobs): (Vec<JobIdx>, Vec<JobIdx>) = unassigned_jobs
            .iter()
            .copied()
            .partition(|&job_id| context.problem.job(job_id).is_break());
        let mut bad_jobs = Vec::new();

        for break_job in breaks {
            let progress = context.progress(jobs.len() + 1);
            insert_break(break_job, routes, context, progress, &mut bad_jobs)?;
        }

        let fleet_manager = Arc::clone(context.calculator.fleet_manager());
        let mut caches: Vec<BinaryHeap<VersionedInsertionData>> =
            (0..context.problem.num_jobs()).map(|_| BinaryHeap::new()).collect();
        let mut versions: Vec<u64> = vec![0; routes.len()];
        let mut modified: SmallVec<[RouteIdx; 2]> = (0..routes.len()).map(RouteIdx::new).collect();

        let mut rounds = 0;
        while !jobs.is_empty() {
            context.check_cancelled()?;
            let progress = context.progress(jobs.len());

            if !modified.is_empty() {
                let evaluated = {
                    let problem = context.problem;
                    let calculator = context.calculator;
                    let routes: &[VehicleRoute] = routes;
                    let route_ids: &[RouteIdx] = &modified;
                    let versions: &[u64] = &versions;
                    let task = |job_id: JobIdx| {
                        evaluate_job(problem, calculator, routes, route_ids, versions, job_id, progress)
                    };
                    match context.thread_pool {
                        Some(pool) => evaluate_in_parallel(pool, jobs.clone(), task)?,
                        None => jobs.iter().copied().map(task).collect(),
                    }
                };
                for (&job_id, entries) in jobs.iter().zip(evaluated) {
                    caches[job_id.get()].extend(entries);
                }
            }

            let mut scored_jobs = Vec::with_capacity(jobs.len());
            for &job_id in &jobs {
                let mut best_two = best_two_from_cache(
                    &mut caches[job_id.get()],
                    routes,
                    &versions,
                    fleet_manager.as_ref(),
                );

                let empty_route = VehicleRoute::empty();
                let data = context.calculator.insertion_data(
                    &empty_route,
                    job_id,
                    &CandidateVehicle::any(&empty_route),
                    best_two.benchmark(),
                    progress,
                );
                best_two.offer(RouteTarget::NewRoute, data);

                scored_jobs.push(score_job(
                    context.problem,
                    self.scorer.as_ref(),
                    job_id,
                    best_two,
                ));
            }

            let mut remaining = Vec::with_capacity(jobs.len());
            let winner = select_winner(context.problem, scored_jobs, &mut remaining, &mut bad_jobs);
            jobs = remaining;
            rounds += 1;

            let Some(ScoredJob::Scored {
                job_id,
                target,
                data,
                ..
            }) = winner
            else {
                break;
            };

            modified.clear();
            let (route_id, displaced) = context.insert(job_id, &data, routes, target)?;
            modified.push(route_id);
            if let Some(break_job) = displaced
                && let Some(break_route) =
                    insert_break(break_job, routes, context, progress, &mut bad_jobs)?
                && break_route != route_id
            {
                modified.push(break_route);
            }

            versions.resize(routes.len(), 0);
            for route_id in &modified {
                versions[route_id.get()] += 1;
            }
        }

        debug!(
            rounds,
            routes = routes.len(),
            bad_jobs = bad_jobs.len(),
            "fast regret insertion done"
        );
        Ok(bad_jobs)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::{
        fleet_manager::FiniteFleetManager,
        problem::{
            amount::Amount, time_window::TimeWindow, vehicle::VehicleTypeBuilder,
            vehicle_routing_problem::VehicleRoutingProblemBuilder,
        },
        recreate::regret_insertion::RegretInsertion,
        solution::{activity::create_activities, driver::Driver},
        test_utils::{
            RecreateFixture, assert_route_feasible, create_basic_services, create_basic_vehicles,
            create_location_grid, create_locations, create_route_with_services, create_service,
            create_test_problem,
        },
    };

    use super::*;

    /// Ten unit-demand services on a 5x5 grid, two vehicles with capacity 4 at opposite corners.
    fn create_grid_problem() -> Arc<VehicleRoutingProblem> {
        let mut vehicle_type = VehicleTypeBuilder::default();
        vehicle_type.set_capacity(Amount::from_vec(vec![4.0]));

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_locations(create_location_grid(5, 5))
            .set_services(
                [3, 7, 9, 11, 13, 16, 18, 20, 22, 23]
                    .into_iter()
                    .map(|location_id| {
                        create_service(
                            &format!("s{location_id}"),
                            location_id,
                            1.0,
                            TimeWindow::default(),
                        )
                    })
                    .collect(),
            )
            .set_vehicle_types(vec![vehicle_type.build()])
            .set_vehicles(create_basic_vehicles(vec![0, 24]));
        Arc::new(builder.build())
    }

    fn solve(
        fixture: &RecreateFixture,
        fast: bool,
        pool: Option<&rayon::ThreadPool>,
    ) -> (Vec<Vec<JobIdx>>, Vec<JobIdx>) {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut context = fixture.context(&mut rng, pool);
        let mut routes = Vec::new();
        let jobs: Vec<JobIdx> = fixture.problem.job_ids().collect();
        fixture.inserter.listeners().insertion_starts(&mut routes, &jobs);

        let bad_jobs = if fast {
            FastRegretInsertion::default().insert_unassigned_jobs(&mut routes, &jobs, &mut context)
        } else {
            RegretInsertion::default().insert_unassigned_jobs(&mut routes, &jobs, &mut context)
        }
        .unwrap();

        for route in &routes {
            assert_route_feasible(&fixture.problem, route);
        }
        (routes.iter().map(VehicleRoute::job_ids).collect(), bad_jobs)
    }

    fn cached_entry(
        problem: &VehicleRoutingProblem,
        job_id: JobIdx,
        vehicle_id: VehicleIdx,
        version: u64,
    ) -> VersionedInsertionData {
        let activity = create_activities(problem, job_id).remove(0);
        let mut data = InsertionData::new(1.0, None, Some(0), vehicle_id, Driver::NoDriver, 0.0);
        data.push_event(Event::InsertActivity {
            vehicle_id,
            activity,
            index: 0,
        });
        data.push_event(Event::SwitchVehicle {
            vehicle_id,
            departure_time: 0.0,
        });
        VersionedInsertionData {
            data,
            route_id: RouteIdx::new(0),
            version,
            rank: 1,
        }
    }

    /// v0 at location 0, v1 and v2 sharing a type at location 1.
    fn create_switch_problem() -> Arc<VehicleRoutingProblem> {
        Arc::new(create_test_problem(
            create_locations(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            create_basic_services(vec![1, 2]),
            create_basic_vehicles(vec![0, 1, 1]),
        ))
    }

    #[test]
    fn test_matches_plain_regret() {
        let fixture = RecreateFixture::new(create_grid_problem());
        let plain = solve(&fixture, false, None);
        let fast = solve(&fixture, true, None);

        assert_eq!(fast, plain);
        assert_eq!(plain.1.len(), 2);
    }

    #[test]
    fn test_parallel_first_round_matches_plain_regret() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let fixture = RecreateFixture::new(create_grid_problem());
        let plain = solve(&fixture, false, None);
        let fast = solve(&fixture, true, Some(&pool));

        assert_eq!(fast, plain);
    }

    #[test]
    fn test_stale_entries_are_dropped() {
        let problem = create_switch_problem();
        let fleet_manager = FiniteFleetManager::new(Arc::clone(&problem));
        let routes = vec![create_route_with_services(&problem, 0, vec![0])];

        let mut cache = BinaryHeap::new();
        cache.push(cached_entry(&problem, JobIdx::new(1), VehicleIdx::new(0), 0));
        let best_two = best_two_from_cache(&mut cache, &routes, &[1], &fleet_manager);

        assert!(best_two.best.is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_locked_vehicle_is_substituted() {
        let problem = create_switch_problem();
        let fleet_manager = FiniteFleetManager::new(Arc::clone(&problem));
        fleet_manager.lock(VehicleIdx::new(0));
        fleet_manager.lock(VehicleIdx::new(1));
        let routes = vec![create_route_with_services(&problem, 0, vec![0])];

        let mut cache = BinaryHeap::new();
        cache.push(cached_entry(&problem, JobIdx::new(1), VehicleIdx::new(1), 0));
        let best_two = best_two_from_cache(&mut cache, &routes, &[0], &fleet_manager);

        let (target, data) = best_two.best.unwrap();
        assert_eq!(target, RouteTarget::Existing(RouteIdx::new(0)));
        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(2)));
        assert!(data.events.iter().all(|event| matches!(
            event,
            Event::InsertActivity { vehicle_id, .. } | Event::SwitchVehicle { vehicle_id, .. }
                if *vehicle_id == VehicleIdx::new(2)
        )));
        // the cache keeps the original entry
        assert_eq!(cache.peek().unwrap().data.vehicle_id, Some(VehicleIdx::new(1)));
    }

    #[test]
    fn test_locked_vehicle_without_substitute_is_skipped_but_kept() {
        let problem = create_switch_problem();
        let fleet_manager = FiniteFleetManager::new(Arc::clone(&problem));
        for vehicle_id in 0..3 {
            fleet_manager.lock(VehicleIdx::new(vehicle_id));
        }
        let routes = vec![create_route_with_services(&problem, 0, vec![0])];

        let mut cache = BinaryHeap::new();
        cache.push(cached_entry(&problem, JobIdx::new(1), VehicleIdx::new(1), 0));
        let best_two = best_two_from_cache(&mut cache, &routes, &[0], &fleet_manager);
        assert!(best_two.best.is_none());
        assert_eq!(cache.len(), 1);

        // usable again once a vehicle of that type is released
        fleet_manager.unlock(VehicleIdx::new(1));
        let best_two = best_two_from_cache(&mut cache, &routes, &[0], &fleet_manager);
        assert_eq!(
            best_two.best.map(|(_, data)| data.vehicle_id),
            Some(Some(VehicleIdx::new(1)))
        );
    }

    #[test]
    fn test_second_best_comes_from_another_route() {
        let problem = create_switch_problem();
        let fleet_manager = FiniteFleetManager::new(Arc::clone(&problem));
        let routes = vec![
            create_route_with_services(&problem, 0, vec![0]),
            create_route_with_services(&problem, 1, vec![]),
        ];

        let mut cache = BinaryHeap::new();
        let mut same_route = cached_entry(&problem, JobIdx::new(1), VehicleIdx::new(0), 0);
        same_route.data.cost = 2.0;
        let mut other_route = cached_entry(&problem, JobIdx::new(1), VehicleIdx::new(1), 0);
        other_route.route_id = RouteIdx::new(1);
        other_route.data.cost = 3.0;
        cache.push(cached_entry(&problem, JobIdx::new(1), VehicleIdx::new(0), 0));
        cache.push(same_route);
        cache.push(other_route);

        let best_two = best_two_from_cache(&mut cache, &routes, &[0, 0], &fleet_manager);
        assert_eq!(best_two.best.map(|(_, data)| data.cost), Some(1.0));
        assert_eq!(best_two.second_best.map(|data| data.cost), Some(3.0));
        assert_eq!(cache.len(), 3);
    }
}
