use crate::{
    problem::{
        job::{Job, JobIdx},
        travel_cost_matrix::Time,
        vehicle::{Vehicle, VehicleIdx},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{activity::TourActivity, driver::Driver, route::VehicleRoute},
};

/// How far the current construction pass is. Threaded explicitly through every evaluation
/// so that no calculator keeps mutable progress of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolutionProgress {
    total_jobs: usize,
    unassigned_jobs: usize,
}

impl Default for SolutionProgress {
    fn default() -> Self {
        SolutionProgress::complete()
    }
}

impl SolutionProgress {
    pub fn new(total_jobs: usize, unassigned_jobs: usize) -> Self {
        SolutionProgress {
            total_jobs,
            unassigned_jobs: unassigned_jobs.min(total_jobs),
        }
    }

    pub fn complete() -> Self {
        SolutionProgress {
            total_jobs: 0,
            unassigned_jobs: 0,
        }
    }

    /// Share of placed jobs, never below one half.
    pub fn completeness_ratio(&self) -> f64 {
        if self.total_jobs == 0 {
            return 1.0;
        }

        let ratio = 1.0 - self.unassigned_jobs as f64 / self.total_jobs as f64;
        ratio.max(0.5)
    }
}

/// Vehicle, driver and departure time under evaluation for a route. `vehicle_id` is `None`
/// when the caller lets the vehicle-selection layer choose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateVehicle {
    pub vehicle_id: Option<VehicleIdx>,
    pub driver: Driver,
    pub departure_time: Time,
}

impl CandidateVehicle {
    pub fn of_route(route: &VehicleRoute) -> Self {
        CandidateVehicle {
            vehicle_id: route.vehicle_id(),
            driver: route.driver(),
            departure_time: route.departure_time(),
        }
    }

    /// Leaves the vehicle open, keeping the route's driver.
    pub fn any(route: &VehicleRoute) -> Self {
        CandidateVehicle {
            vehicle_id: None,
            driver: route.driver(),
            departure_time: route.departure_time(),
        }
    }

    pub fn new(vehicle_id: VehicleIdx, driver: Driver, departure_time: Time) -> Self {
        CandidateVehicle {
            vehicle_id: Some(vehicle_id),
            driver,
            departure_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivityContext {
    pub arrival_time: Time,
    pub end_time: Time,
    pub insertion_index: usize,
}

/// Immutable view handed to constraints and cost estimators while a job is evaluated
/// against one route and one candidate vehicle.
#[derive(Clone, Copy)]
pub struct JobInsertionContext<'a> {
    pub problem: &'a VehicleRoutingProblem,
    pub route: &'a VehicleRoute,
    pub job_id: JobIdx,
    pub new_vehicle: VehicleIdx,
    pub new_driver: Driver,
    pub new_departure_time: Time,
    pub progress: SolutionProgress,
    pub activity_context: ActivityContext,
    /// Context of the already placed pickup while a shipment delivery is evaluated.
    pub related_activity_context: Option<ActivityContext>,
}

impl<'a> JobInsertionContext<'a> {
    pub fn new(
        problem: &'a VehicleRoutingProblem,
        route: &'a VehicleRoute,
        job_id: JobIdx,
        new_vehicle: VehicleIdx,
        new_driver: Driver,
        new_departure_time: Time,
        progress: SolutionProgress,
    ) -> Self {
        JobInsertionContext {
            problem,
            route,
            job_id,
            new_vehicle,
            new_driver,
            new_departure_time,
            progress,
            activity_context: ActivityContext::default(),
            related_activity_context: None,
        }
    }

    #[inline]
    pub fn job(&self) -> &'a Job {
        self.problem.job(self.job_id)
    }

    #[inline]
    pub fn vehicle(&self) -> &'a Vehicle {
        self.problem.vehicle(self.new_vehicle)
    }

    pub fn is_vehicle_switch(&self) -> bool {
        self.route.vehicle_id() != Some(self.new_vehicle)
    }
}

/// One candidate gap: `new` between `prev` and `next`. Positions index the route states;
/// `prev_position` is `None` when `prev` is a tentative activity of the job itself.
#[derive(Clone, Copy)]
pub struct ActivityInsertion<'a> {
    pub prev: &'a TourActivity,
    pub prev_position: Option<usize>,
    pub new: &'a TourActivity,
    pub next: &'a TourActivity,
    pub next_position: usize,
    pub prev_end_time: Time,
}

impl ActivityInsertion<'_> {
    /// Arrival at the new activity when leaving `prev` at `prev_end_time`.
    #[inline]
    pub fn arrival_at_new(&self, problem: &VehicleRoutingProblem) -> Time {
        self.prev_end_time + problem.travel_time(self.prev.location_id(), self.new.location_id())
    }
}
