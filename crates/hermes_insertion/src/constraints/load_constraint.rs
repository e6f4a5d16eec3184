use crate::{
    insertion::insertion_context::{ActivityInsertion, JobInsertionContext},
    problem::{amount::EMPTY_AMOUNT, job::Job},
    solution::activity::ActivityType,
};

use super::{
    activity_constraint::HardActivityConstraint, constraints_status::ConstraintsStatus,
    route_constraint::HardRouteConstraint,
};

/// Capacity check of service-like jobs against the route's aggregate loads.
#[derive(Debug, Clone, Default)]
pub struct LoadRouteConstraint;

impl HardRouteConstraint for LoadRouteConstraint {
    fn constraint_name(&self) -> &'static str {
        "load_route"
    }

    fn fulfilled(&self, context: &JobInsertionContext) -> bool {
        let capacity = context
            .problem
            .vehicle_type(context.vehicle().vehicle_type())
            .capacity();
        let states = context.route.states();

        if !states.max_load().fits_in(capacity) {
            return false;
        }

        match context.job() {
            Job::Delivery(service) => states
                .load_at_beginning()
                .added(service.demand())
                .fits_in(capacity),
            Job::Service(service) | Job::Pickup(service) => {
                states.load_at_end().added(service.demand()).fits_in(capacity)
            }
            Job::Shipment(shipment) => shipment.demand().fits_in(capacity),
            Job::Break(_) => true,
        }
    }
}

/// Capacity check at the insertion gap, using the load, past and future maximum load states.
#[derive(Debug, Clone, Default)]
pub struct LoadActivityConstraint;

impl HardActivityConstraint for LoadActivityConstraint {
    fn constraint_name(&self) -> &'static str {
        "load_activity"
    }

    fn fulfilled(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> ConstraintsStatus {
        let capacity = context
            .problem
            .vehicle_type(context.vehicle().vehicle_type())
            .capacity();
        let states = context.route.states();
        let demand = context.job().demand();

        match (context.job(), insertion.new.activity_type()) {
            (Job::Shipment(_), ActivityType::Pickup(_)) => {
                let load = insertion
                    .prev_position
                    .map_or(&EMPTY_AMOUNT, |position| states.load_at(position));
                if load.added(demand).fits_in(capacity) {
                    ConstraintsStatus::Fulfilled
                } else {
                    ConstraintsStatus::NotFulfilled
                }
            }
            (Job::Shipment(_), ActivityType::Delivery(_)) => {
                let load = insertion
                    .prev_position
                    .map_or(&EMPTY_AMOUNT, |position| states.load_at(position));
                if load.added(demand).fits_in(capacity) {
                    ConstraintsStatus::Fulfilled
                } else {
                    ConstraintsStatus::NotFulfilledBreak
                }
            }
            (Job::Service(_) | Job::Pickup(_), _) => {
                let future_max = insertion
                    .prev_position
                    .map_or(&EMPTY_AMOUNT, |position| states.future_max_load_at(position));
                if future_max.added(demand).fits_in(capacity) {
                    ConstraintsStatus::Fulfilled
                } else {
                    ConstraintsStatus::NotFulfilled
                }
            }
            (Job::Delivery(_), _) => {
                let past_max = insertion
                    .prev_position
                    .map_or(&EMPTY_AMOUNT, |position| states.past_max_load_at(position));
                if past_max.added(demand).fits_in(capacity) {
                    ConstraintsStatus::Fulfilled
                } else {
                    ConstraintsStatus::NotFulfilledBreak
                }
            }
            _ => ConstraintsStatus::Fulfilled,
        }
    }
}
