use std::sync::Arc;

use crate::{
    problem::{
        job::{JobIdx, JobKind},
        travel_cost_matrix::Cost,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::route::VehicleRoute,
};

use super::{
    insertion_context::{CandidateVehicle, SolutionProgress},
    insertion_data::InsertionData,
    job_insertion_calculator::JobInsertionCostsCalculator,
};

/// Routes each job to the calculator registered for its kind.
pub struct JobCalculatorSwitcher {
    problem: Arc<VehicleRoutingProblem>,
    calculators: [Arc<dyn JobInsertionCostsCalculator>; JobKind::COUNT],
}

impl JobCalculatorSwitcher {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        service: Arc<dyn JobInsertionCostsCalculator>,
        shipment: Arc<dyn JobInsertionCostsCalculator>,
        vehicle_break: Arc<dyn JobInsertionCostsCalculator>,
    ) -> Self {
        let calculators = JobKind::ALL.map(|kind| match kind {
            JobKind::Service | JobKind::Pickup | JobKind::Delivery => Arc::clone(&service),
            JobKind::Shipment => Arc::clone(&shipment),
            JobKind::Break => Arc::clone(&vehicle_break),
        });

        JobCalculatorSwitcher {
            problem,
            calculators,
        }
    }
}

impl JobInsertionCostsCalculator for JobCalculatorSwitcher {
    fn insertion_data(
        &self,
        route: &VehicleRoute,
        job_id: JobIdx,
        candidate: &CandidateVehicle,
        best_known_cost: Cost,
        progress: SolutionProgress,
    ) -> InsertionData {
        let kind = self.problem.job(job_id).kind();
        self.calculators[kind.index()].insertion_data(
            route,
            job_id,
            candidate,
            best_known_cost,
            progress,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::vehicle::VehicleIdx,
        solution::driver::Driver,
        test_utils::{create_shipment, create_test_problem_with_shipments},
    };

    use super::*;

    struct Fixed(Cost);

    impl JobInsertionCostsCalculator for Fixed {
        fn insertion_data(
            &self,
            _route: &VehicleRoute,
            _job_id: JobIdx,
            candidate: &CandidateVehicle,
            _best_known_cost: Cost,
            _progress: SolutionProgress,
        ) -> InsertionData {
            InsertionData::new(
                self.0,
                Some(0),
                Some(0),
                candidate.vehicle_id.unwrap_or(VehicleIdx::new(0)),
                Driver::NoDriver,
                0.0,
            )
        }
    }

    #[test]
    fn test_dispatches_on_job_kind() {
        let problem = Arc::new(create_test_problem_with_shipments(vec![create_shipment(
            "s", 1, 2, 1.0,
        )]));
        let switcher = JobCalculatorSwitcher::new(
            Arc::clone(&problem),
            Arc::new(Fixed(1.0)),
            Arc::new(Fixed(2.0)),
            Arc::new(Fixed(3.0)),
        );
        let route = VehicleRoute::new(&problem, VehicleIdx::new(0), 0.0);

        let data = switcher.insertion_data(
            &route,
            JobIdx::new(0),
            &CandidateVehicle::of_route(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_eq!(data.cost, 2.0);
    }
}
