use std::{cmp::Ordering, collections::BinaryHeap, sync::Arc};

use crate::{
    constraints::{constraint_manager::ConstraintManager, constraints_status::ConstraintsStatus},
    problem::{job::JobIdx, travel_cost_matrix::Cost, vehicle_routing_problem::VehicleRoutingProblem},
    solution::{
        activity::{TourActivity, create_activities},
        route::VehicleRoute,
    },
};

use super::{
    activity_insertion_costs::RouteLevelActivityInsertionCosts,
    auxiliary_path_cost::AuxiliaryPathCost,
    insertion_context::{
        ActivityContext, ActivityInsertion, CandidateVehicle, JobInsertionContext, SolutionProgress,
    },
    insertion_data::{Event, InsertionData},
    job_insertion_calculator::{JobInsertionCostsCalculator, end_time_at},
};

/// Approximated gap, ordered so that the cheapest (then the earliest found) pops first.
struct ApproximateInsertion {
    cost: Cost,
    sequence: usize,
    index: usize,
}

impl PartialEq for ApproximateInsertion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ApproximateInsertion {}

impl PartialOrd for ApproximateInsertion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApproximateInsertion {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Two-phase insertion of services: every feasible gap is approximated with the route-level
/// estimator, then up to `memory` of the best approximations are priced exactly over the whole
/// tour. With `memory == 0` the best approximation is taken as is.
pub struct RouteLevelServiceInsertionCalculator {
    problem: Arc<VehicleRoutingProblem>,
    constraints: Arc<ConstraintManager>,
    estimator: RouteLevelActivityInsertionCosts,
    memory: usize,
}

impl RouteLevelServiceInsertionCalculator {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        constraints: Arc<ConstraintManager>,
        forward_looking: usize,
        memory: usize,
    ) -> Self {
        RouteLevelServiceInsertionCalculator {
            problem,
            constraints,
            estimator: RouteLevelActivityInsertionCosts::new(forward_looking),
            memory,
        }
    }
}

impl JobInsertionCostsCalculator for RouteLevelServiceInsertionCalculator {
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

        let Some(new) = create_activities(problem, job_id).into_iter().next() else {
            return InsertionData::no_insertion_found();
        };
        let vehicle = problem.vehicle(vehicle_id);
        let start = TourActivity::start(vehicle, candidate.departure_time);
        let end = TourActivity::end(vehicle);
        let activities = route.activities();
        let states = route.states();

        let mut queue = BinaryHeap::new();
        let mut prev = &start;
        let mut prev_end_time = candidate.departure_time;
        let mut prefix_cost_new_vehicle = 0.0;

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
                    let estimate = self.estimator.cost(&context, &insertion);
                    let cost = prefix_cost_new_vehicle - states.cost_at(index) + estimate.cost;
                    if cost < best_known_cost {
                        queue.push(ApproximateInsertion {
                            cost,
                            sequence: queue.len(),
                            index,
                        });
                    }
                }
                ConstraintsStatus::NotFulfilledBreak => break,
                ConstraintsStatus::NotFulfilled => {}
            }

            let arrival_at_next =
                prev_end_time + problem.travel_time(prev.location_id(), next.location_id());
            prefix_cost_new_vehicle += problem.transport_cost(
                prev.location_id(),
                next.location_id(),
                vehicle_id,
            ) + problem.activity_cost(next, arrival_at_next, vehicle_id);
            prev_end_time = end_time_at(problem, prev, next, prev_end_time);
            prev = next;
        }

        let mut best_cost = best_known_cost;
        let mut best_index = None;
        if self.memory == 0 {
            if let Some(approximation) = queue.pop() {
                best_cost = approximation.cost;
                best_index = Some(approximation.index);
            }
        } else {
            let path_cost = AuxiliaryPathCost::new(problem);
            let old_cost = states.total_cost();
            for _ in 0..self.memory {
                let Some(approximation) = queue.pop() else {
                    break;
                };

                let mut tour: Vec<&TourActivity> = Vec::with_capacity(activities.len() + 3);
                tour.push(&start);
                tour.extend(activities[..approximation.index].iter());
                tour.push(&new);
                tour.extend(activities[approximation.index..].iter());
                tour.push(&end);

                let cost = path_cost.cost_of_path(&tour, candidate.departure_time, vehicle_id) - old_cost;
                if cost < best_cost {
                    best_cost = cost;
                    best_index = Some(approximation.index);
                }
            }
        }

        let Some(index) = best_index else {
            return InsertionData::no_insertion_found();
        };

        let mut data = InsertionData::new(
            best_cost,
            None,
            Some(index),
            vehicle_id,
            candidate.driver,
            candidate.departure_time,
        );
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
        insertion::{
            activity_insertion_costs::{ActivityInsertionCosts, LocalActivityInsertionCosts},
            service_insertion::ServiceInsertionCalculator,
        },
        problem::time_window::TimeWindow,
        test_utils::{
            assert_close, create_basic_vehicles, create_locations, create_route_with_services,
            create_service, create_test_problem,
        },
    };

    use super::*;

    fn create_problem() -> Arc<VehicleRoutingProblem> {
        Arc::new(create_test_problem(
            create_locations(vec![
                (0.0, 0.0),
                (4.0, 0.0),
                (8.0, 0.0),
                (8.0, 4.0),
                (0.0, 4.0),
                (5.0, 1.0),
            ]),
            vec![
                create_service("a", 1, 0.0, TimeWindow::default()),
                create_service("b", 2, 0.0, TimeWindow::default()),
                create_service("c", 3, 0.0, TimeWindow::default()),
                create_service("d", 4, 0.0, TimeWindow::default()),
                create_service("new", 5, 0.0, TimeWindow::default()),
            ],
            create_basic_vehicles(vec![0]),
        ))
    }

    fn route_level(problem: &Arc<VehicleRoutingProblem>, memory: usize) -> RouteLevelServiceInsertionCalculator {
        RouteLevelServiceInsertionCalculator::new(
            Arc::clone(problem),
            Arc::new(ConstraintManager::with_defaults()),
            2,
            memory,
        )
    }

    #[test]
    fn test_without_memory_takes_best_approximation() {
        let problem = create_problem();
        let route = create_route_with_services(&problem, 0, vec![0, 1, 2, 3]);

        let data = route_level(&problem, 0).insertion_data(
            &route,
            JobIdx::new(4),
            &CandidateVehicle::of_route(&route),
            f64::MAX,
            SolutionProgress::complete(),
        );

        // between (4, 0) and (8, 0)
        assert_eq!(data.delivery_index, Some(1));
        assert_close(data.cost, 2f64.sqrt() + 10f64.sqrt() - 4.0);
    }

    #[test]
    fn test_full_memory_never_worse_than_local() {
        let problem = create_problem();
        let route = create_route_with_services(&problem, 0, vec![0, 1, 2, 3]);
        let candidate = CandidateVehicle::of_route(&route);

        let local = ServiceInsertionCalculator::new(
            Arc::clone(&problem),
            Arc::new(ConstraintManager::with_defaults()),
            ActivityInsertionCosts::Local(LocalActivityInsertionCosts::default()),
        )
        .insertion_data(
            &route,
            JobIdx::new(4),
            &candidate,
            f64::MAX,
            SolutionProgress::complete(),
        );

        let refined = route_level(&problem, route.len() + 1).insertion_data(
            &route,
            JobIdx::new(4),
            &candidate,
            f64::MAX,
            SolutionProgress::complete(),
        );

        assert!(refined.cost <= local.cost + 1e-9);
        assert_eq!(refined.delivery_index, local.delivery_index);
        assert_close(refined.cost, route_with_new_cost(&problem, &route) - route.total_cost(&problem));
    }

    fn route_with_new_cost(problem: &Arc<VehicleRoutingProblem>, route: &VehicleRoute) -> Cost {
        let with_new = create_route_with_services(problem, 0, vec![0, 4, 1, 2, 3]);
        assert_eq!(with_new.len(), route.len() + 1);
        with_new.total_cost(problem)
    }
}
