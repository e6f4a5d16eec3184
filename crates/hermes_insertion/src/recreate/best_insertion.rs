use tracing::{Level, debug, instrument};

use crate::{
    error::InsertionError,
    insertion::{
        insertion_context::CandidateVehicle, insertion_data::InsertionData,
        job_insertion_calculator::JobInsertionCostsCalculator,
    },
    problem::job::JobIdx,
    solution::route::{RouteIdx, VehicleRoute},
};

use super::recreate_context::{RecreateContext, RouteTarget};

/// Inserts the jobs one after the other, in random order, each at its cheapest position over
/// all routes and a new route.
#[derive(Default)]
pub struct BestInsertion;

impl BestInsertion {
    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn insert_unassigned_jobs(
        &self,
        routes: &mut Vec<VehicleRoute>,
        unassigned_jobs: &[JobIdx],
        context: &mut RecreateContext,
    ) -> Result<Vec<JobIdx>, InsertionError> {
        let mut jobs = context.shuffled_jobs(unassigned_jobs);
        let mut bad_jobs = Vec::new();

        let mut next = 0;
        while next < jobs.len() {
            context.check_cancelled()?;
            let job_id = jobs[next];
            let progress = context.progress(jobs.len() - next);
            next += 1;

            // noise is never negative, so the best noised score still bounds the search
            let mut best: Option<(RouteTarget, InsertionData)> = None;
            let mut best_score = f64::MAX;

            for (index, route) in routes.iter().enumerate() {
                let route_id = RouteIdx::new(index);
                let data = context.calculator.insertion_data(
                    route,
                    job_id,
                    &CandidateVehicle::any(route),
                    best_score,
                    progress,
                );
                if data.is_no_insertion_found() {
                    continue;
                }
                let score = data.cost + context.noise(job_id);
                if score < best_score {
                    best_score = score;
                    best = Some((RouteTarget::Existing(route_id), data));
                }
            }

            let empty_route = VehicleRoute::empty();
            let data = context.calculator.insertion_data(
                &empty_route,
                job_id,
                &CandidateVehicle::any(&empty_route),
                best_score,
                progress,
            );
            if !data.is_no_insertion_found() && data.cost + context.noise(job_id) < best_score {
                best = Some((RouteTarget::NewRoute, data));
            }

            match best {
                Some((target, data)) => {
                    let (_, displaced) = context.insert(job_id, &data, routes, target)?;
                    jobs.extend(displaced);
                }
                None => bad_jobs.push(job_id),
            }
        }

        debug!(
            routes = routes.len(),
            bad_jobs = bad_jobs.len(),
            "best insertion done"
        );
        Ok(bad_jobs)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::test_utils::{
        RecreateFixture, assert_route_feasible, create_scenario_a_problem,
    };

    use super::*;

    fn run(fixture: &RecreateFixture, seed: u64) -> (Vec<VehicleRoute>, Vec<JobIdx>) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut context = fixture.context(&mut rng, None);
        let mut routes = Vec::new();
        let jobs: Vec<JobIdx> = fixture.problem.job_ids().collect();
        fixture.inserter.listeners().insertion_starts(&mut routes, &jobs);

        let bad_jobs = BestInsertion
            .insert_unassigned_jobs(&mut routes, &jobs, &mut context)
            .unwrap();
        (routes, bad_jobs)
    }

    #[test]
    fn test_infinite_fleet_places_every_job() {
        let fixture = RecreateFixture::new(create_scenario_a_problem(true));
        let (routes, bad_jobs) = run(&fixture, 1);

        assert!(bad_jobs.is_empty());
        assert_eq!(routes.iter().map(VehicleRoute::len).sum::<usize>(), 4);
        for route in &routes {
            assert!(route.len() <= 2);
            assert_route_feasible(&fixture.problem, route);
        }
    }

    #[test]
    fn test_fixed_costs_fill_routes_before_opening_new_ones() {
        let fixture = RecreateFixture::with_fixed_costs(create_scenario_a_problem(true));
        let (routes, bad_jobs) = run(&fixture, 7);

        assert!(bad_jobs.is_empty());
        assert_eq!(routes.len(), 2);
        assert!(routes.iter().all(|route| route.len() == 2));
    }

    #[test]
    fn test_single_vehicle_leaves_two_bad_jobs() {
        let fixture = RecreateFixture::new(create_scenario_a_problem(false));
        let (routes, bad_jobs) = run(&fixture, 3);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].len(), 2);
        assert_eq!(bad_jobs.len(), 2);
        assert_route_feasible(&fixture.problem, &routes[0]);

        let vehicle_id = routes[0].vehicle_id().unwrap();
        assert!(fixture.fleet_manager.is_locked(vehicle_id));
        assert!(fixture.fleet_manager.available_vehicles().is_empty());
    }

    #[test]
    fn test_same_seed_same_solution() {
        let fixture = RecreateFixture::new(create_scenario_a_problem(true));
        let (first, first_bad) = run(&fixture, 42);
        let (second, second_bad) = run(&fixture, 42);

        assert_eq!(first_bad, second_bad);
        assert_eq!(
            first.iter().map(VehicleRoute::job_ids).collect::<Vec<_>>(),
            second.iter().map(VehicleRoute::job_ids).collect::<Vec<_>>()
        );
        let total = |routes: &[VehicleRoute]| -> f64 {
            routes.iter().map(|route| route.total_cost(&fixture.problem)).sum()
        };
        assert_eq!(total(&first), total(&second));
    }
}
