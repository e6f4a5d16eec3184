use std::sync::Arc;

use crate::{
    constraints::{constraint_manager::ConstraintManager, constraints_status::ConstraintsStatus},
    problem::{
        job::JobIdx,
        travel_cost_matrix::{Cost, Time},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{
        activity::{TourActivity, create_activities},
        route::VehicleRoute,
    },
};

use super::{
    access_egress::access_egress_delta,
    activity_insertion_costs::ActivityInsertionCosts,
    insertion_context::{
        ActivityContext, ActivityInsertion, CandidateVehicle, JobInsertionContext, SolutionProgress,
    },
    insertion_data::{Event, InsertionData},
    job_insertion_calculator::{JobInsertionCostsCalculator, end_time_at},
};

/// Single-activity jobs: services, pickups and deliveries.
pub struct ServiceInsertionCalculator {
    problem: Arc<VehicleRoutingProblem>,
    constraints: Arc<ConstraintManager>,
    activity_costs: ActivityInsertionCosts,
}

impl ServiceInsertionCalculator {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        constraints: Arc<ConstraintManager>,
        activity_costs: ActivityInsertionCosts,
    ) -> Self {
        ServiceInsertionCalculator {
            problem,
            constraints,
            activity_costs,
        }
    }
}

impl JobInsertionCostsCalculator for ServiceInsertionCalculator {
    fn insertion_data(
        &self,
        route: &VehicleRoute,
        job_id: JobIdx,
        candidate: &CandidateVehicle,
        best_known_cost: Cost,
        progress: SolutionProgress,
    ) -> InsertionData {
        let Some(vehicle_id) = candidate.vehicle_id else {
            return InsertionData::no_insertion_found();
        };
        let problem = self.problem.as_ref();
        let mut context = JobInsertionContext::new(
            problem,
            route,
            job_id,
            vehicle_id,
            candidate.driver,
            candidate.departure_time,
            progress,
        );

        if !self.constraints.hard_route_fulfilled(&context) {
            return InsertionData::no_insertion_found();
        }

        let route_costs =
            self.constraints.soft_route_costs(&context) + access_egress_delta(&context);

        let Some(new) = create_activities(problem, job_id).into_iter().next() else {
            return InsertionData::no_insertion_found();
        };
        let vehicle = problem.vehicle(vehicle_id);
        let start = TourActivity::start(vehicle, candidate.departure_time);
        let end = TourActivity::end(vehicle);

        let mut best_cost = best_known_cost;
        let mut best: Option<(usize, Time)> = None;
        let mut prev = &start;
        let mut prev_end_time = candidate.departure_time;
        let activities = route.activities();

        for index in 0..=activities.len() {
            let next = activities.get(index).unwrap_or(&end);
            let insertion = ActivityInsertion {
                prev,
                prev_position: Some(index),
                new: &new,
                next,
                next_position: index + 1,
                prev_end_time,
            };
            let arrival_time = insertion.arrival_at_new(problem);
            context.activity_context = ActivityContext {
                arrival_time,
                end_time: new.departure_after(arrival_time),
                insertion_index: index,
            };

            match self.constraints.hard_activity_fulfilled(&context, &insertion) {
                ConstraintsStatus::Fulfilled => {
                    let activity_cost = self.activity_costs.cost(&context, &insertion);
                    let cost = route_costs
                        + self.constraints.soft_activity_costs(&context, &insertion)
                        + activity_cost.cost;
                    if cost < best_cost {
                        best_cost = cost;
                        best = Some((index, activity_cost.additional_time));
                    }
                }
                ConstraintsStatus::NotFulfilledBreak => break,
                ConstraintsStatus::NotFulfilled => {}
            }

            prev_end_time = end_time_at(problem, prev, next, prev_end_time);
            prev = next;
        }

        let Some((index, additional_time)) = best else {
            return InsertionData::no_insertion_found();
        };

        let mut data = InsertionData::new(
            best_cost,
            None,
            Some(index),
            vehicle_id,
            candidate.driver,
            candidate.departure_time,
        )
        .with_additional_time(additional_time);
        data.push_event(Event::InsertActivity {
            vehicle_id,
            activity: new,
            index,
        });
        data.push_event(Event::SwitchVehicle {
            vehicle_id,
            departure_time: candidate.departure_time,
        });
        data
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        constraints::{
            activity_constraint::SoftActivityConstraintType,
            max_waiting_constraint::MaxWaitingSoftConstraint,
            route_constraint::SoftRouteConstraintType,
            vehicle_switch_constraint::VehicleSwitchCostConstraint,
        },
        insertion::activity_insertion_costs::LocalActivityInsertionCosts,
        problem::{time_window::TimeWindow, vehicle::VehicleIdx},
        solution::driver::Driver,
        test_utils::{
            assert_close, create_basic_services, create_basic_vehicles, create_locations,
            create_route_with_services, create_service, create_test_problem,
        },
    };

    use super::*;

    fn calculator(problem: &Arc<VehicleRoutingProblem>) -> ServiceInsertionCalculator {
        calculator_with(problem, ConstraintManager::with_defaults())
    }

    fn calculator_with(
        problem: &Arc<VehicleRoutingProblem>,
        constraints: ConstraintManager,
    ) -> ServiceInsertionCalculator {
        ServiceInsertionCalculator::new(
            Arc::clone(problem),
            Arc::new(constraints),
            ActivityInsertionCosts::Local(LocalActivityInsertionCosts::default()),
        )
    }

    #[test]
    fn test_picks_cheapest_gap() {
        let problem = Arc::new(create_test_problem(
            create_locations(vec![(0.0, 0.0), (10.0, 0.0), (5.0, 1.0), (0.0, 10.0)]),
            create_basic_services(vec![1, 3, 2]),
            create_basic_vehicles(vec![0]),
        ));
        let route = create_route_with_services(&problem, 0, vec![0, 1]);

        let data = calculator(&problem).insertion_data(
            &route,
            JobIdx::new(2),
            &CandidateVehicle::of_route(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );

        assert_eq!(data.delivery_index, Some(0));
        assert_eq!(data.pickup_index, None);
        assert_eq!(data.vehicle_id, Some(VehicleIdx::new(0)));
        assert_close(data.cost, 2.0 * 26f64.sqrt() - 10.0);
        assert_eq!(data.events.len(), 2);
    }

    #[test]
    fn test_best_known_cost_is_strict() {
        let problem = Arc::new(create_test_problem(
            create_locations(vec![(0.0, 0.0), (3.0, 4.0)]),
            create_basic_services(vec![1]),
            create_basic_vehicles(vec![0]),
        ));
        let route = VehicleRoute::new(&problem, VehicleIdx::new(0), 0.0);
        let candidate = CandidateVehicle::of_route(&route);

        let calculator = calculator(&problem);
        let found = calculator.insertion_data(
            &route,
            JobIdx::new(0),
            &candidate,
            10.5,
            SolutionProgress::complete(),
        );
        assert_close(found.cost, 10.0);

        let tie = calculator.insertion_data(
            &route,
            JobIdx::new(0),
            &candidate,
            10.0,
            SolutionProgress::complete(),
        );
        assert!(tie.is_no_insertion_found());
    }

    #[test]
    fn test_time_windows_force_late_position() {
        let problem = Arc::new(create_test_problem(
            create_locations(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            vec![
                create_service("first", 1, 0.0, TimeWindow::default()),
                create_service("late", 2, 0.0, TimeWindow::new(30.0, 40.0)),
                create_service("early", 1, 0.0, TimeWindow::new(0.0, 5.0)),
            ],
            create_basic_vehicles(vec![0]),
        ));
        let route = create_route_with_services(&problem, 0, vec![1]);

        let data = calculator(&problem).insertion_data(
            &route,
            JobIdx::new(2),
            &CandidateVehicle::of_route(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_eq!(data.delivery_index, Some(0));

        let after_late = calculator(&problem).insertion_data(
            &route,
            JobIdx::new(0),
            &CandidateVehicle::of_route(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert!(!after_late.is_no_insertion_found());
    }

    #[test]
    fn test_without_vehicle_returns_sentinel() {
        let problem = Arc::new(create_test_problem(
            create_locations(vec![(0.0, 0.0), (1.0, 0.0)]),
            create_basic_services(vec![1]),
            create_basic_vehicles(vec![0]),
        ));
        let route = VehicleRoute::empty();
        let candidate = CandidateVehicle::of_route(&route);

        let data = calculator(&problem).insertion_data(
            &route,
            JobIdx::new(0),
            &candidate,
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_eq!(data, InsertionData::no_insertion_found());
    }

    #[test]
    fn test_waiting_cost_moves_insertion_later() {
        // the vehicle idles at the first stop until 5, so the late job waits less behind it
        let problem = Arc::new(create_test_problem(
            create_locations(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            vec![
                create_service("idle", 1, 0.0, TimeWindow::new(5.0, 100.0)),
                create_service("late", 2, 0.0, TimeWindow::new(10.0, 100.0)),
            ],
            create_basic_vehicles(vec![0]),
        ));
        let route = create_route_with_services(&problem, 0, vec![0]);
        let candidate = CandidateVehicle::of_route(&route);

        let without_waiting = calculator(&problem).insertion_data(
            &route,
            JobIdx::new(1),
            &candidate,
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_eq!(without_waiting.delivery_index, Some(0));
        assert_close(without_waiting.cost, 2.0);

        let mut constraints = ConstraintManager::with_defaults();
        constraints.add_soft_activity_constraint(SoftActivityConstraintType::MaxWaiting(
            MaxWaitingSoftConstraint::new(1.0),
        ));
        let with_waiting = calculator_with(&problem, constraints).insertion_data(
            &route,
            JobIdx::new(1),
            &candidate,
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_eq!(with_waiting.delivery_index, Some(1));
        assert_close(with_waiting.cost, 2.0 + 4.0);
    }

    #[test]
    fn test_vehicle_switch_cost_only_for_other_vehicle() {
        let problem = Arc::new(create_test_problem(
            create_locations(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]),
            create_basic_services(vec![1, 2]),
            create_basic_vehicles(vec![0, 0]),
        ));
        let route = create_route_with_services(&problem, 0, vec![0]);

        let mut constraints = ConstraintManager::with_defaults();
        constraints.add_soft_route_constraint(SoftRouteConstraintType::VehicleSwitch(
            VehicleSwitchCostConstraint::new(7.0),
        ));
        let calculator = calculator_with(&problem, constraints);

        let same_vehicle = calculator.insertion_data(
            &route,
            JobIdx::new(1),
            &CandidateVehicle::of_route(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_close(same_vehicle.cost, 2.0);

        let other_vehicle = calculator.insertion_data(
            &route,
            JobIdx::new(1),
            &CandidateVehicle::new(VehicleIdx::new(1), Driver::NoDriver, 0.0),
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_eq!(other_vehicle.vehicle_id, Some(VehicleIdx::new(1)));
        assert_close(other_vehicle.cost, 2.0 + 7.0);

        let empty = VehicleRoute::new(&problem, VehicleIdx::new(0), 0.0);
        let first_job = calculator.insertion_data(
            &empty,
            JobIdx::new(1),
            &CandidateVehicle::new(VehicleIdx::new(1), Driver::NoDriver, 0.0),
            f64::MAX,
            SolutionProgress::complete(),
        );
        assert_close(first_job.cost, 4.0);
    }
}
