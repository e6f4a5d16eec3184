use std::sync::Arc;

use tracing::{Level, debug, instrument};

use crate::{
    error::InsertionError,
    insertion::{
        insertion_context::{CandidateVehicle, SolutionProgress},
        insertion_data::{InsertionData, MAX_COST},
        job_insertion_calculator::JobInsertionCostsCalculator,
    },
    problem::{job::JobIdx, travel_cost_matrix::Cost, vehicle_routing_problem::VehicleRoutingProblem},
    solution::route::{RouteIdx, VehicleRoute},
};

use super::{
    recreate_context::{BestTwo, RecreateContext, RouteTarget},
    scoring::{DefaultScorer, ScoringFunction},
};

/// Outcome of scoring one job in a regret round.
#[derive(Debug)]
pub enum ScoredJob {
    Scored {
        job_id: JobIdx,
        score: f64,
        target: RouteTarget,
        data: InsertionData,
    },
    Bad(JobIdx),
}

impl ScoredJob {
    pub fn job_id(&self) -> JobIdx {
        match self {
            ScoredJob::Scored { job_id, .. } | ScoredJob::Bad(job_id) => *job_id,
        }
    }

    /// Higher score first, then the smaller external id.
    fn outranks(&self, other: &ScoredJob, problem: &VehicleRoutingProblem) -> bool {
        match (self, other) {
            (
                ScoredJob::Scored { job_id, score, .. },
                ScoredJob::Scored {
                    job_id: other_job,
                    score: other_score,
                    ..
                },
            ) => {
                score > other_score
                    || (score == other_score
                        && problem.job(*job_id).external_id()
                            < problem.job(*other_job).external_id())
            }
            (ScoredJob::Scored { .. }, ScoredJob::Bad(_)) => true,
            (ScoredJob::Bad(_), _) => false,
        }
    }
}

/// Regret of a job: how much is lost if it does not get its best insertion. A job with a
/// single option is ranked above any job with an alternative.
pub fn regret_score(best_cost: Cost, second_best_cost: Option<Cost>, extra_score: f64) -> f64 {
    match second_best_cost {
        Some(second_best_cost) => second_best_cost - best_cost + extra_score,
        None => MAX_COST - best_cost + extra_score,
    }
}

pub(crate) fn score_job(
    problem: &VehicleRoutingProblem,
    scorer: &dyn ScoringFunction,
    job_id: JobIdx,
    best_two: BestTwo,
) -> ScoredJob {
    match best_two.best {
        None => ScoredJob::Bad(job_id),
        Some((target, data)) => {
            let extra_score = scorer.score(problem, &data, job_id);
            let score = regret_score(
                data.cost,
                best_two.second_best.as_ref().map(|second_best| second_best.cost),
                extra_score,
            );
            ScoredJob::Scored {
                job_id,
                score,
                target,
                data,
            }
        }
    }
}

/// Keeps the best ranked of the scored jobs, pushing the ones without insertion to
/// `bad_jobs` and the others to `remaining`.
pub(crate) fn select_winner(
    problem: &VehicleRoutingProblem,
    scored_jobs: impl IntoIterator<Item = ScoredJob>,
    remaining: &mut Vec<JobIdx>,
    bad_jobs: &mut Vec<JobIdx>,
) -> Option<ScoredJob> {
    let mut winner: Option<ScoredJob> = None;

    for scored in scored_jobs {
        match scored {
            ScoredJob::Bad(job_id) => bad_jobs.push(job_id),
            scored => {
                remaining.push(scored.job_id());
                if winner
                    .as_ref()
                    .is_none_or(|current| scored.outranks(current, problem))
                {
                    winner = Some(scored);
                }
            }
        }
    }

    if let Some(winner) = &winner {
        let job_id = winner.job_id();
        remaining.retain(|&other| other != job_id);
    }
    winner
}

/// Places a break on the route of the vehicle it belongs to, or reports it as bad when that
/// vehicle has no route or no feasible position.
pub(crate) fn insert_break(
    break_job: JobIdx,
    routes: &mut Vec<VehicleRoute>,
    context: &RecreateContext,
    progress: SolutionProgress,
    bad_jobs: &mut Vec<JobIdx>,
) -> Result<Option<RouteIdx>, InsertionError> {
    let owner = routes.iter().position(|route| {
        route
            .vehicle_id()
            .and_then(|vehicle_id| context.problem.vehicle(vehicle_id).break_job())
            == Some(break_job)
    });
    let Some(index) = owner else {
        bad_jobs.push(break_job);
        return Ok(None);
    };

    let route = &routes[index];
    let data = context.calculator.insertion_data(
        route,
        break_job,
        &CandidateVehicle::of_route(route),
        f64::MAX,
        progress,
    );
    if data.is_no_insertion_found() {
        bad_jobs.push(break_job);
        return Ok(None);
    }

    let (route_id, displaced) =
        context.insert(break_job, &data, routes, RouteTarget::Existing(RouteIdx::new(index)))?;
    bad_jobs.extend(displaced);
    Ok(Some(route_id))
}

/// Inserts, one per round, the job whose best insertion would be the most regretted if it
/// were postponed. Breaks are placed first, on the routes of their vehicles.
pub struct RegretInsertion {
    scorer: Arc<dyn ScoringFunction>,
}

impl Default for RegretInsertion {
    fn default() -> Self {
        RegretInsertion::new(Arc::new(DefaultScorer::default()))
    }
}

impl RegretInsertion {
    pub fn new(scorer: Arc<dyn ScoringFunction>) -> Self {
        RegretInsertion { scorer }
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

        let mut rounds = 0;
        while !jobs.is_empty() {
            context.check_cancelled()?;
            let progress = context.progress(jobs.len());

            let scored_jobs: Vec<ScoredJob> = {
                let routes: &[VehicleRoute] = routes;
                let context: &RecreateContext = context;
                jobs.iter()
                    .map(|&job_id| {
                        let best_two = self.best_two(routes, job_id, context, progress);
                        score_job(context.problem, self.scorer.as_ref(), job_id, best_two)
                    })
                    .collect()
            };

            let mut remaining = Vec::with_capacity(jobs.len());
            let winner =
                select_winner(context.problem, scored_jobs, &mut remaining, &mut bad_jobs);
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

            let (_, displaced) = context.insert(job_id, &data, routes, target)?;
            if let Some(break_job) = displaced {
                insert_break(break_job, routes, context, progress, &mut bad_jobs)?;
            }
        }

        debug!(
            rounds,
            routes = routes.len(),
            bad_jobs = bad_jobs.len(),
            "regret insertion done"
        );
        Ok(bad_jobs)
    }

    fn best_two(
        &self,
        routes: &[VehicleRoute],
        job_id: JobIdx,
        context: &RecreateContext,
        progress: SolutionProgress,
    ) -> BestTwo {
        let mut best_two = BestTwo::default();

        for (index, route) in routes.iter().enumerate() {
            let data = context.calculator.insertion_data(
                route,
                job_id,
                &CandidateVehicle::any(route),
                best_two.benchmark(),
                progress,
            );
            best_two.offer(RouteTarget::Existing(RouteIdx::new(index)), data);
        }

        let empty_route = VehicleRoute::empty();
        let data = context.calculator.insertion_data(
            &empty_route,
            job_id,
            &CandidateVehicle::any(&empty_route),
            best_two.benchmark(),
            progress,
        );
        best_two.offer(RouteTarget::NewRoute, data);

        best_two
    }
}
