use crate::{insertion::insertion_context::JobInsertionContext, problem::job::Job};

use super::route_constraint::HardRouteConstraint;

/// A break only ever rides with the vehicle it belongs to.
#[derive(Debug, Clone, Default)]
pub struct VehicleBreakConstraint;

impl HardRouteConstraint for VehicleBreakConstraint {
    fn constraint_name(&self) -> &'static str {
        "vehicle_break"
    }

    fn fulfilled(&self, context: &JobInsertionContext) -> bool {
        match context.job() {
            Job::Break(vehicle_break) => vehicle_break.vehicle_id() == context.new_vehicle,
            _ => true,
        }
    }
}
