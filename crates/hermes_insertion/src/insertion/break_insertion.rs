use std::sync::Arc;

use crate::{
    constraints::{constraint_manager::ConstraintManager, constraints_status::ConstraintsStatus},
    problem::{
        job::{Job, JobIdx},
        location::LocationIdx,
        travel_cost_matrix::{Cost, Time},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{
        activity::{TourActivity, create_activities},
        route::VehicleRoute,
    },
};

use super::{
    activity_insertion_costs::ActivityInsertionCosts,
    insertion_context::{
        ActivityContext, ActivityInsertion, CandidateVehicle, JobInsertionContext, SolutionProgress,
    },
    insertion_data::{Event, InsertionData},
    job_insertion_calculator::{JobInsertionCostsCalculator, end_time_at},
};

/// Breaks have no location of their own: each gap is tried at the predecessor's and at the
/// successor's location. Only the vehicle owning the break and a non-empty route qualify.
pub struct BreakInsertionCalculator {
    problem: Arc<VehicleRoutingProblem>,
    constraints: Arc<ConstraintManager>,
    activity_costs: ActivityInsertionCosts,
}

impl BreakInsertionCalculator {
    pub fn new(
        problem: Arc<VehicleRoutingProblem>,
        constraints: Arc<ConstraintManager>,
        activity_costs: ActivityInsertionCosts,
    ) -> Self {
        BreakInsertionCalculator {
            problem,
            constraints,
            activity_costs,
        }
    }
}

impl JobInsertionCostsCalculator for BreakInsertionCalculator {
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
        let Job::Break(vehicle_break) = problem.job(job_id) else {
            return InsertionData::no_insertion_found();
        };
        if vehicle_break.vehicle_id() != vehicle_id
            || problem.vehicle(vehicle_id).break_job() != Some(job_id)
            || route.is_empty()
        {
            return InsertionData::no_insertion_found();
        }

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
        let route_costs = self.constraints.soft_route_costs(&context);

        let Some(mut break_activity) = create_activities(problem, job_id).into_iter().next() else {
            return InsertionData::no_insertion_found();
        };

        let vehicle = problem.vehicle(vehicle_id);
        let start = TourActivity::start(vehicle, candidate.departure_time);
        let end = TourActivity::end(vehicle);
        let activities = route.activities();

        let mut best_cost = best_known_cost;
        let mut best: Option<(usize, LocationIdx, Time)> = None;
        let mut prev = &start;
        let mut prev_end_time = candidate.departure_time;

        for index in 0..=activities.len() {
            let next = activities.get(index).unwrap_or(&end);
            let mut stop_scan = true;

            for location_id in [prev.location_id(), next.location_id()] {
                break_activity.set_location_id(location_id);
                let insertion = ActivityInsertion {
                    prev,
                    prev_position: Some(index),
                    new: &break_activity,
                    next,
                    next_position: index + 1,
                    prev_end_time,
                };
                let arrival_time = insertion.arrival_at_new(problem);
                context.activity_context = ActivityContext {
                    arrival_time,
                    end_time: break_activity.departure_after(arrival_time),
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
                            best = Some((index, location_id, activity_cost.additional_time));
                        }
                        stop_scan = false;
                    }
                    ConstraintsStatus::NotFulfilled => stop_scan = false,
                    ConstraintsStatus::NotFulfilledBreak => {}
                }
            }

            if stop_scan {
                break;
            }

            prev_end_time = end_time_at(problem, prev, next, prev_end_time);
            prev = next;
        }

        let Some((index, location_id, additional_time)) = best else {
            return InsertionData::no_insertion_found();
        };
        break_activity.set_location_id(location_id);

        let mut data = InsertionData::new(
            best_cost,
            None,
            Some(index),
            vehicle_id,
            candidate.driver,
            candidate.departure_time,
        )
        .with_additional_time(additional_time);
        data.push_event(Event::InsertBreak {
            vehicle_id,
            activity: break_activity,
            index,
        });
        data.push_event(Event::SwitchVehicle {
            vehicle_id,
            departure_time: candidate.departure_time,
        });
        data
    }
}
