use rand::Rng;
use tracing::{Level, debug, instrument};

use crate::{
    error::InsertionError,
    insertion::{
        insertion_context::{CandidateVehicle, SolutionProgress},
        insertion_data::InsertionData,
        job_insertion_calculator::JobInsertionCostsCalculator,
        vehicle_type_dependent::VehicleTypeDependentCalculator,
    },
    problem::job::JobIdx,
    solution::route::{RouteIdx, VehicleRoute},
};

use super::{
    parallel::evaluate_in_parallel,
    recreate_context::{RecreateContext, RouteTarget},
};

/// Best insertion with the routes split into batches that are evaluated on the thread pool.
/// Batch winners are merged in batch order, so the outcome does not depend on scheduling.
pub struct BestInsertionConcurrent {
    num_batches: usize,
}

impl BestInsertionConcurrent {
    pub fn new(num_batches: usize) -> Self {
        BestInsertionConcurrent {
            num_batches: num_batches.max(1),
        }
    }

    pub fn num_batches(&self) -> usize {
        self.num_batches
    }

    #[instrument(skip_all, level = Level::DEBUG)]
    pub fn insert_unassigned_jobs(
        &self,
        routes: &mut Vec<VehicleRoute>,
        unassigned_jobs: &[JobIdx],
        context: &mut RecreateContext,
    ) -> Result<Vec<JobIdx>, InsertionError> {
        let mut jobs = context.shuffled_jobs(unassigned_jobs);
        let mut bad_jobs = Vec::new();

        let mut batches: Vec<Vec<RouteIdx>> = vec![Vec::new(); self.num_batches];
        for index in 0..routes.len() {
            batches[index % self.num_batches].push(RouteIdx::new(index));
        }

        let mut next = 0;
        while next < jobs.len() {
            context.check_cancelled()?;
            let job_id = jobs[next];
            let progress = context.progress(jobs.len() - next);
            next += 1;

            let mut best: Option<(RouteTarget, InsertionData)> = None;
            let mut best_score = f64::MAX;

            let batch_results = {
                let routes = &routes[..];
                let calculator = context.calculator;
                let task = |batch: &Vec<RouteIdx>| {
                    best_in_batch(calculator, routes, batch, job_id, progress)
                };
                match context.thread_pool {
                    Some(pool) => evaluate_in_parallel(pool, batches.iter().collect(), task)?,
                    None => batches.iter().map(task).collect(),
                }
            };

            // noise is drawn here, in batch order, to keep the per-job generators deterministic
            for (route_id, data) in batch_results.into_iter().flatten() {
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
                    let (route_id, displaced) = context.insert(job_id, &data, routes, target)?;
                    if target == RouteTarget::NewRoute {
                        let batch = context.rng.random_range(0..self.num_batches);
                        batches[batch].push(route_id);
                    }
                    jobs.extend(displaced);
                }
                None => bad_jobs.push(job_id),
            }
        }

        debug!(
            routes = routes.len(),
            bad_jobs = bad_jobs.len(),
            batches = self.num_batches,
            "concurrent best insertion done"
        );
        Ok(bad_jobs)
    }
}

fn best_in_batch(
    calculator: &VehicleTypeDependentCalculator,
    routes: &[VehicleRoute],
    batch: &[RouteIdx],
    job_id: JobIdx,
    progress: SolutionProgress,
) -> Option<(RouteIdx, InsertionData)> {
    let mut best = None;
    let mut best_cost = f64::MAX;

    for &route_id in batch {
        let route = &routes[route_id];
        let data = calculator.insertion_data(
            route,
            job_id,
            &CandidateVehicle::any(route),
            best_cost,
            progress,
        );
        if !data.is_no_insertion_found() && data.cost < best_cost {
            best_cost = data.cost;
            best = Some((route_id, data));
        }
    }

    best
}
