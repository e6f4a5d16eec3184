use crate::{
    problem::{
        job::JobIdx,
        travel_cost_matrix::{Cost, Time},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{activity::TourActivity, route::VehicleRoute},
};

use super::{
    insertion_context::{CandidateVehicle, SolutionProgress},
    insertion_data::InsertionData,
};

/// Evaluates the cheapest feasible insertion of a job into a route for a candidate vehicle.
/// Returns [`InsertionData::no_insertion_found`] when nothing beats `best_known_cost`.
pub trait JobInsertionCostsCalculator: Send + Sync {
    fn insertion_data(
        &self,
        route: &VehicleRoute,
        job_id: JobIdx,
        candidate: &CandidateVehicle,
        best_known_cost: Cost,
        progress: SolutionProgress,
    ) -> InsertionData;
}

/// End time at `next` when leaving `prev` at `prev_end_time`.
#[inline]
pub(crate) fn end_time_at(
    problem: &VehicleRoutingProblem,
    prev: &TourActivity,
    next: &TourActivity,
    prev_end_time: Time,
) -> Time {
    next.departure_after(prev_end_time + problem.travel_time(prev.location_id(), next.location_id()))
}
