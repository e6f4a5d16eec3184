use std::sync::Arc;

use crate::{
    problem::{
        amount::Amount,
        job::JobIdx,
        travel_cost_matrix::Cost,
        vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::route::VehicleRoute,
};

use super::{
    insertion_context::{CandidateVehicle, SolutionProgress},
    insertion_data::{InsertionData, MAX_COST},
    job_insertion_calculator::JobInsertionCostsCalculator,
};

/// Adds the change in fixed vehicle costs to every insertion. Early in construction the
/// fixed cost is shared out in proportion to the used capacity; as the solution fills up
/// the full fixed cost takes over.
pub struct FixCostsCalculator {
    problem: Arc<VehicleRoutingProblem>,
    inner: Box<dyn JobInsertionCostsCalculator>,
    weight: f64,
}

impl FixCostsCalculator {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        inner: Box<dyn JobInsertionCostsCalculator>,
        weight: f64,
    ) -> Self {
        FixCostsCalculator {
            problem,
            inner,
            weight,
        }
    }

    pub fn fix_cost_contribution(
        &self,
        route: &VehicleRoute,
        job_id: JobIdx,
        new_vehicle: VehicleIdx,
        progress: SolutionProgress,
    ) -> Cost {
        let ratio = progress.completeness_ratio();
        let current_max_load = route.states().max_load();
        let load = current_max_load.added(self.problem.job(job_id).demand());

        let relative = self.relative_delta(route, new_vehicle, current_max_load, &load);
        let absolute = self.absolute_delta(route, new_vehicle, &load);
        let delta = (1.0 - ratio) * relative + ratio * absolute;

        self.weight * ratio * delta
    }

    fn absolute_delta(&self, route: &VehicleRoute, new_vehicle: VehicleIdx, load: &Amount) -> Cost {
        let new_type = self.problem.vehicle_type_of(new_vehicle);
        if !load.fits_in(new_type.capacity()) {
            return MAX_COST;
        }

        let current = route
            .vehicle_id()
            .map_or(0.0, |vehicle_id| self.problem.vehicle_type_of(vehicle_id).fixed_cost());
        new_type.fixed_cost() - current
    }

    fn relative_delta(
        &self,
        route: &VehicleRoute,
        new_vehicle: VehicleIdx,
        current_load: &Amount,
        load: &Amount,
    ) -> Cost {
        let new_type = self.problem.vehicle_type_of(new_vehicle);
        if !load.fits_in(new_type.capacity()) {
            return MAX_COST;
        }

        let current = route.vehicle_id().map_or(0.0, |vehicle_id| {
            let vehicle_type = self.problem.vehicle_type_of(vehicle_id);
            vehicle_type.fixed_cost() * current_load.ratio_to(vehicle_type.capacity())
        });
        new_type.fixed_cost() * load.ratio_to(new_type.capacity()) - current
    }
}

impl JobInsertionCostsCalculator for FixCostsCalculator {
    fn insertion_data(
        &self,
        route: &VehicleRoute,
        job_id: JobIdx,
        candidate: &CandidateVehicle,
        best_known_cost: Cost,
        progress: SolutionProgress,
    ) -> InsertionData {
        let Some(new_vehicle) = candidate.vehicle_id else {
            return InsertionData::no_insertion_found();
        };

        let contribution = self.fix_cost_contribution(route, job_id, new_vehicle, progress);
        if contribution > best_known_cost {
            return InsertionData::no_insertion_found();
        }

        let data = self
            .inner
            .insertion_data(route, job_id, candidate, best_known_cost, progress);
        if data.is_no_insertion_found() {
            return data;
        }

        let cost = data.cost + contribution;
        data.with_cost(cost)
    }
}
