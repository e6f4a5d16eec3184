use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
    fleet_manager::FleetManager,
    problem::{
        job::JobIdx, travel_cost_matrix::Cost, vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::route::VehicleRoute,
};

use super::{
    insertion_context::{CandidateVehicle, SolutionProgress},
    insertion_data::InsertionData,
    job_insertion_calculator::JobInsertionCostsCalculator,
};

/// Tries every vehicle that could serve the route and keeps the cheapest insertion.
///
/// A route with a vehicle considers that vehicle first, then, when switching is allowed and
/// the route is not an initial route, one available vehicle of every other type. An empty
/// route considers every available vehicle. A candidate naming a vehicle is passed through.
pub struct VehicleTypeDependentCalculator {
    problem: Arc<VehicleRoutingProblem>,
    fleet_manager: Arc<dyn FleetManager>,
    inner: Box<dyn JobInsertionCostsCalculator>,
    allow_vehicle_switch: bool,
}

impl VehicleTypeDependentCalculator {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        fleet_manager: Arc<dyn FleetManager>,
        inner: Box<dyn JobInsertionCostsCalculator>,
        allow_vehicle_switch: bool,
    ) -> Self {
        VehicleTypeDependentCalculator {
            problem,
            fleet_manager,
            inner,
            allow_vehicle_switch,
        }
    }

    pub fn fleet_manager(&self) -> &Arc<dyn FleetManager> {
        &self.fleet_manager
    }

    pub(crate) fn relevant_vehicles(&self, route: &VehicleRoute) -> SmallVec<[VehicleIdx; 8]> {
        match route.vehicle_id() {
            Some(current) => {
                let mut vehicles = SmallVec::new();
                vehicles.push(current);
                if self.allow_vehicle_switch && !self.problem.is_initial_route_vehicle(current) {
                    vehicles.extend(
                        self.fleet_manager
                            .available_vehicles_except(self.fleet_manager.type_key(current)),
                    );
                }
                vehicles
            }
            None => self.fleet_manager.available_vehicles().into_iter().collect(),
        }
    }
}

impl JobInsertionCostsCalculator for VehicleTypeDependentCalculator {
    fn insertion_data(
        &self,
        route: &VehicleRoute,
        job_id: JobIdx,
        candidate: &CandidateVehicle,
        best_known_cost: Cost,
        progress: SolutionProgress,
    ) -> InsertionData {
        if candidate.vehicle_id.is_some() {
            return self
                .inner
                .insertion_data(route, job_id, candidate, best_known_cost, progress);
        }

        let mut best = InsertionData::no_insertion_found();
        let mut best_cost = best_known_cost;

        for vehicle_id in self.relevant_vehicles(route) {
            let departure_time = if route.vehicle_id() == Some(vehicle_id) {
                route.departure_time()
            } else {
                self.problem.vehicle(vehicle_id).earliest_departure()
            };
            let candidate = CandidateVehicle::new(vehicle_id, route.driver(), departure_time);

            let data = self
                .inner
                .insertion_data(route, job_id, &candidate, best_cost, progress);
            if !data.is_no_insertion_found() && data.cost < best_cost {
                best_cost = data.cost;
                best = data;
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        constraints::constraint_manager::ConstraintManager,
        fleet_manager::FiniteFleetManager,
        insertion::{
            activity_insertion_costs::{ActivityInsertionCosts, LocalActivityInsertionCosts},
            service_insertion::ServiceInsertionCalculator,
        },
        problem::vehicle_routing_problem::VehicleRoutingProblemBuilder,
        test_utils::{
            assert_close, create_basic_services, create_basic_vehicles, create_locations,
            create_route_with_services,
        },
    };

    use super::*;

    fn create_problem(initial_routes: Vec<usize>) -> Arc<VehicleRoutingProblem> {
        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .set_locations(create_locations(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (11.0, 0.0),
                (12.0, 0.0),
            ]))
            .set_services(create_basic_services(vec![1, 2]))
            .set_vehicles(create_basic_vehicles(vec![0, 3]))
            .set_initial_route_vehicles(initial_routes);
        Arc::new(builder.build())
    }

    fn calculator(
        problem: &Arc<VehicleRoutingProblem>,
        allow_vehicle_switch: bool,
    ) -> VehicleTypeDependentCalculator {
        VehicleTypeDependentCalculator::new(
            Arc::clone(problem),
            Arc::new(FiniteFleetManager::new(Arc::clone(problem))),
            Box::new(ServiceInsertionCalculator::new(
                Arc::clone(problem),
                Arc::new(ConstraintManager::with_defaults()),
                ActivityInsertionCosts::Local(LocalActivityInsertionCosts::default()),
            )),
            allow_vehicle_switch,
        )
    }

    #[test]
    fn test_empty_route_picks_cheapest_vehicle() {
        let problem = create_problem(vec![]);
        let route = VehicleRoute::empty();

        let data = calculator(&problem, true).insertion_data(
            &route,
            JobIdx::new(0),
            &CandidateVehicle::any(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );

        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(1)));
        assert_close(data.cost, 4.0);
    }

    #[test]
    fn test_switches_vehicle_only_when_allowed() {
        let problem = create_problem(vec![]);
        let route = create_route_with_services(&problem, 0, vec![0]);
        let calculator = calculator(&problem, true);
        calculator.fleet_manager().lock(VehicleIdx::new(0));

        let data = calculator.insertion_data(
            &route,
            JobIdx::new(1),
            &CandidateVehicle::any(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );
        // 0 -> 10 -> 0 costs 20, 12 -> 10 -> 11 -> 12 costs 4
        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(1)));
        assert_close(data.cost, 4.0 - 20.0);

        let data = calculator_without_switch(&problem).insertion_data(
            &route,
            JobIdx::new(1),
            &CandidateVehicle::any(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(0)));
        assert_close(data.cost, 2.0);
    }

    fn calculator_without_switch(problem: &Arc<VehicleRoutingProblem>) -> VehicleTypeDependentCalculator {
        calculator(problem, false)
    }

    #[test]
    fn test_initial_routes_keep_their_vehicle() {
        let problem = create_problem(vec![0]);
        let route = create_route_with_services(&problem, 0, vec![0]);

        let data = calculator(&problem, true).insertion_data(
            &route,
            JobIdx::new(1),
            &CandidateVehicle::any(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(0)));
    }
}
