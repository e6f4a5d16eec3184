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

/// Pickup and delivery pairs. Every pickup gap is combined with every delivery gap at or
/// after it.
pub struct ShipmentInsertionCalculator {
    problem: Arc<VehicleRoutingProblem>,
    constraints: Arc<ConstraintManager>,
    activity_costs: ActivityInsertionCosts,
}

struct BestShipmentInsertion {
    pickup_index: usize,
    delivery_index: usize,
    additional_time: Time,
}

impl ShipmentInsertionCalculator {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        constraints: Arc<ConstraintManager>,
        activity_costs: ActivityInsertionCosts,
    ) -> Self {
        ShipmentInsertionCalculator {
            problem,
            constraints,
            activity_costs,
        }
    }
}

impl JobInsertionCostsCalculator for ShipmentInsertionCalculator {
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

        let mut activities_of_job = create_activities(problem, job_id).into_iter();
        let (Some(pickup), Some(delivery)) = (activities_of_job.next(), activities_of_job.next())
        else {
            return InsertionData::no_insertion_found();
        };

        let vehicle = problem.vehicle(vehicle_id);
        let start = TourActivity::start(vehicle, candidate.departure_time);
        let end = TourActivity::end(vehicle);
        let activities = route.activities();

        let mut best_cost = best_known_cost;
        let mut best: Option<BestShipmentInsertion> = None;
        let mut prev = &start;
        let mut prev_end_time = candidate.departure_time;

        for i in 0..=activities.len() {
            let next = activities.get(i).unwrap_or(&end);
            let pickup_insertion = ActivityInsertion {
                prev,
                prev_position: Some(i),
                new: &pickup,
                next,
                next_position: i + 1,
                prev_end_time,
            };
            let pickup_arrival = pickup_insertion.arrival_at_new(problem);
            let pickup_context = ActivityContext {
                arrival_time: pickup_arrival,
                end_time: pickup.departure_after(pickup_arrival),
                insertion_index: i,
            };
            context.activity_context = pickup_context;
            context.related_activity_context = None;

            match self.constraints.hard_activity_fulfilled(&context, &pickup_insertion) {
                ConstraintsStatus::NotFulfilledBreak => break,
                ConstraintsStatus::NotFulfilled => {
                    prev_end_time = end_time_at(problem, prev, next, prev_end_time);
                    prev = next;
                    continue;
                }
                ConstraintsStatus::Fulfilled => {}
            }

            let pickup_soft_costs = self.constraints.soft_activity_costs(&context, &pickup_insertion);
            let pickup_cost = self.activity_costs.cost(&context, &pickup_insertion);

            context.related_activity_context = Some(pickup_context);
            let mut delivery_prev = &pickup;
            let mut delivery_prev_position = None;
            let mut delivery_prev_end_time = pickup_context.end_time;

            for j in i..=activities.len() {
                let delivery_next = activities.get(j).unwrap_or(&end);
                let delivery_insertion = ActivityInsertion {
                    prev: delivery_prev,
                    prev_position: delivery_prev_position,
                    new: &delivery,
                    next: delivery_next,
                    next_position: j + 1,
                    prev_end_time: delivery_prev_end_time,
                };
                let delivery_arrival = delivery_insertion.arrival_at_new(problem);
                context.activity_context = ActivityContext {
                    arrival_time: delivery_arrival,
                    end_time: delivery.departure_after(delivery_arrival),
                    insertion_index: j,
                };

                match self.constraints.hard_activity_fulfilled(&context, &delivery_insertion) {
                    ConstraintsStatus::Fulfilled => {
                        let delivery_soft_costs =
                            self.constraints.soft_activity_costs(&context, &delivery_insertion);
                        let delivery_cost = self.activity_costs.cost(&context, &delivery_insertion);
                        let cost = route_costs
                            + pickup_soft_costs
                            + pickup_cost.cost
                            + delivery_soft_costs
                            + delivery_cost.cost;
                        if cost < best_cost {
                            best_cost = cost;
                            best = Some(BestShipmentInsertion {
                                pickup_index: i,
                                delivery_index: j,
                                additional_time: pickup_cost.additional_time
                                    + delivery_cost.additional_time,
                            });
                        }
                    }
                    ConstraintsStatus::NotFulfilledBreak => break,
                    ConstraintsStatus::NotFulfilled => {}
                }

                delivery_prev_end_time =
                    end_time_at(problem, delivery_prev, delivery_next, delivery_prev_end_time);
                delivery_prev = delivery_next;
                delivery_prev_position = Some(j + 1);
            }

            prev_end_time = end_time_at(problem, prev, next, prev_end_time);
            prev = next;
        }

        let Some(best) = best else {
            return InsertionData::no_insertion_found();
        };

        let mut data = InsertionData::new(
            best_cost,
            Some(best.pickup_index),
            Some(best.delivery_index),
            vehicle_id,
            candidate.driver,
            candidate.departure_time,
        )
        .with_additional_time(best.additional_time);
        data.push_event(Event::InsertActivity {
            vehicle_id,
            activity: delivery,
            index: best.delivery_index,
        });
        data.push_event(Event::InsertActivity {
            vehicle_id,
            activity: pickup,
            index: best.pickup_index,
        });
        data.push_event(Event::SwitchVehicle {
            vehicle_id,
            departure_time: candidate.departure_time,
        });
        data
    }
}
