use std::sync::Arc;

use crate::{
    insertion::insertion_data::InsertionData,
    problem::{job::JobIdx, vehicle_routing_problem::VehicleRoutingProblem},
    recreate::listeners::InsertionListener,
    solution::route::VehicleRoute,
};

use super::route_states::RouteStates;

/// Keeps route schedules and [`RouteStates`] in sync with route mutations.
pub struct StateUpdater {
    problem: Arc<VehicleRoutingProblem>,
}

impl StateUpdater {
    pub fn new(problem: Arc<VehicleRoutingProblem>) -> Self {
        StateUpdater { problem }
    }

    pub fn update_route(problem: &VehicleRoutingProblem, route: &mut VehicleRoute) {
        route.update_schedule(problem);
        let states = RouteStates::compute(problem, route);
        route.set_states(states);
    }
}

impl InsertionListener for StateUpdater {
    fn insertion_starts(&self, routes: &mut [VehicleRoute], _unassigned_jobs: &[JobIdx]) {
        for route in routes.iter_mut() {
            StateUpdater::update_route(&self.problem, route);
        }
    }

    fn job_inserted(&self, _job_id: JobIdx, route: &mut VehicleRoute, _data: &InsertionData) {
        StateUpdater::update_route(&self.problem, route);
    }
}
