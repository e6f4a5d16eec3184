use std::sync::Arc;

use crate::{
    problem::{job::JobIdx, travel_cost_matrix::Cost, vehicle_routing_problem::VehicleRoutingProblem},
    solution::route::VehicleRoute,
};

use super::{
    insertion_context::{CandidateVehicle, SolutionProgress},
    insertion_data::InsertionData,
    job_insertion_calculator::JobInsertionCostsCalculator,
};

/// Scales the cost of keeping a job on a penalty vehicle, so that real vehicles win as soon
/// as the fleet allows it.
pub struct PenaltyVehicleCalculator {
    problem: Arc<VehicleRoutingProblem>,
    inner: Box<dyn JobInsertionCostsCalculator>,
}

impl PenaltyVehicleCalculator {
    pub fn new(problem: Arc<VehicleRoutingProblem>, inner: Box<dyn JobInsertionCostsCalculator>) -> Self {
        PenaltyVehicleCalculator { problem, inner }
    }
}

impl JobInsertionCostsCalculator for PenaltyVehicleCalculator {
    fn insertion_data(
        &self,
        route: &VehicleRoute,
        job_id: JobIdx,
        candidate: &CandidateVehicle,
        best_known_cost: Cost,
        progress: SolutionProgress,
    ) -> InsertionData {
        let data = self
            .inner
            .insertion_data(route, job_id, candidate, best_known_cost, progress);

        let (Some(old_vehicle), Some(new_vehicle)) = (route.vehicle_id(), candidate.vehicle_id) else {
            return data;
        };
        if data.is_no_insertion_found() || !self.problem.vehicle_type_of(old_vehicle).is_penalty() {
            return data;
        }

        match self.problem.vehicle_type_of(new_vehicle).penalty_factor() {
            Some(factor) => {
                let cost = data.cost * factor;
                data.with_cost(cost)
            }
            None => data,
        }
    }
}
