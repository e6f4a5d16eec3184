use crate::insertion::insertion_context::{ActivityInsertion, JobInsertionContext};

use super::{activity_constraint::HardActivityConstraint, constraints_status::ConstraintsStatus};

/// Time windows of the new activity, of its successor and of the candidate vehicle. The
/// successor's latest start is read from the route states of the new vehicle's end group.
#[derive(Debug, Clone, Default)]
pub struct TimeWindowActivityConstraint;

impl HardActivityConstraint for TimeWindowActivityConstraint {
    fn constraint_name(&self) -> &'static str {
        "time_window"
    }

    fn fulfilled(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> ConstraintsStatus {
        let problem = context.problem;
        let vehicle = context.vehicle();
        let latest_vehicle_arrival = vehicle.latest_arrival();
        let (prev, new, next) = (insertion.prev, insertion.new, insertion.next);

        let (latest_arrival_at_next, next_location) = if next.is_end() {
            let location = if vehicle.return_to_depot() {
                vehicle.end_location_id()
            } else {
                new.location_id()
            };
            (latest_vehicle_arrival, location)
        } else {
            let latest = context
                .route
                .states()
                .latest_start_at(vehicle.end_group(), insertion.next_position)
                .min(next.latest_start());
            (latest, next.location_id())
        };

        if latest_vehicle_arrival < prev.earliest_start()
            || latest_vehicle_arrival < new.earliest_start()
            || latest_vehicle_arrival < next.earliest_start()
        {
            return ConstraintsStatus::NotFulfilledBreak;
        }

        if new.latest_start() < prev.earliest_start() {
            return ConstraintsStatus::NotFulfilledBreak;
        }

        if new.earliest_start() > next.latest_start() {
            return ConstraintsStatus::NotFulfilled;
        }

        let direct_arrival_at_next =
            insertion.prev_end_time + problem.travel_time(prev.location_id(), next_location);
        if direct_arrival_at_next > latest_arrival_at_next {
            return ConstraintsStatus::NotFulfilledBreak;
        }

        let arrival_at_new = insertion.arrival_at_new(problem);
        let end_at_new = new.departure_after(arrival_at_new);
        let travel_new_next = problem.travel_time(new.location_id(), next_location);
        let latest_arrival_at_new = new
            .latest_start()
            .min(latest_arrival_at_next - travel_new_next - new.operation_time());
        if arrival_at_new > latest_arrival_at_new {
            return ConstraintsStatus::NotFulfilled;
        }

        if next.is_end() && !vehicle.return_to_depot() {
            return ConstraintsStatus::Fulfilled;
        }

        if end_at_new + travel_new_next > latest_arrival_at_next {
            return ConstraintsStatus::NotFulfilled;
        }

        ConstraintsStatus::Fulfilled
    }
}
