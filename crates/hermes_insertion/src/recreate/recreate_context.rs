use std::sync::atomic::{AtomicBool, Ordering};

use rand::{rngs::SmallRng, seq::SliceRandom};

use crate::{
    error::InsertionError,
    insertion::{
        insertion_context::SolutionProgress, insertion_data::InsertionData,
        vehicle_type_dependent::VehicleTypeDependentCalculator,
    },
    problem::{job::JobIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solution::route::{RouteIdx, VehicleRoute},
};

use super::{inserter::Inserter, noise::NoiseGenerator};

/// Where a winning insertion lands: an existing route or a route opened for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Existing(RouteIdx),
    NewRoute,
}

pub struct RecreateContext<'a> {
    pub problem: &'a VehicleRoutingProblem,
    pub calculator: &'a VehicleTypeDependentCalculator,
    pub inserter: &'a Inserter,
    pub rng: &'a mut SmallRng,
    pub noise_generator: Option<&'a NoiseGenerator>,
    pub thread_pool: Option<&'a rayon::ThreadPool>,
    pub cancellation: Option<&'a AtomicBool>,
}

impl<'a> RecreateContext<'a> {
    pub fn progress(&self, unassigned_jobs: usize) -> SolutionProgress {
        SolutionProgress::new(self.problem.num_jobs(), unassigned_jobs)
    }

    pub fn noise(&self, job_id: JobIdx) -> f64 {
        self.noise_generator
            .map_or(0.0, |noise_generator| noise_generator.create_noise(job_id))
    }

    pub fn check_cancelled(&self) -> Result<(), InsertionError> {
        match self.cancellation {
            Some(cancelled) if cancelled.load(Ordering::Relaxed) => Err(InsertionError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Shuffles the jobs, keeping breaks last so that their vehicles are already in use.
    pub fn shuffled_jobs(&mut self, unassigned_jobs: &[JobIdx]) -> Vec<JobIdx> {
        let (breaks, mut jobs): (Vec<JobIdx>, Vec<JobIdx>) = unassigned_jobs
            .iter()
            .copied()
            .partition(|&job_id| self.problem.job(job_id).is_break());

        jobs.shuffle(&mut *self.rng);
        jobs.extend(breaks);
        jobs
    }

    /// Applies `data`, opening a route first for [`RouteTarget::NewRoute`]. Returns the route
    /// that received the job and a break displaced by a vehicle switch, if any.
    pub fn insert(
        &self,
        job_id: JobIdx,
        data: &InsertionData,
        routes: &mut Vec<VehicleRoute>,
        target: RouteTarget,
    ) -> Result<(RouteIdx, Option<JobIdx>), InsertionError> {
        let route_id = match target {
            RouteTarget::Existing(route_id) => route_id,
            RouteTarget::NewRoute => {
                routes.push(VehicleRoute::empty());
                RouteIdx::new(routes.len() - 1)
            }
        };

        let displaced = self
            .inserter
            .insert_job(job_id, data, &mut routes[route_id])?;
        Ok((route_id, displaced))
    }
}

/// Best and second best insertion of a job over a set of routes, one candidate per route.
#[derive(Debug, Default)]
pub struct BestTwo {
    pub best: Option<(RouteTarget, InsertionData)>,
    pub second_best: Option<InsertionData>,
}

impl BestTwo {
    /// Cost a new candidate has to beat to matter.
    pub fn benchmark(&self) -> f64 {
        self.second_best.as_ref().map_or(f64::MAX, |data| data.cost)
    }

    pub fn offer(&mut self, target: RouteTarget, data: InsertionData) {
        if data.is_no_insertion_found() {
            return;
        }

        match &self.best {
            None => self.best = Some((target, data)),
            Some((_, best)) if data.cost < best.cost => {
                self.second_best = self.best.take().map(|(_, best)| best);
                self.best = Some((target, data));
            }
            Some(_) => {
                if self
                    .second_best
                    .as_ref()
                    .is_none_or(|second_best| data.cost < second_best.cost)
                {
                    self.second_best = Some(data);
                }
            }
        }
    }
}
