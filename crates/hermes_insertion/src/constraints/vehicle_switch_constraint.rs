use crate::{insertion::insertion_context::JobInsertionContext, problem::travel_cost_matrix::Cost};

use super::route_constraint::SoftRouteConstraint;

/// Flat cost for moving a non-empty route onto another vehicle.
#[derive(Debug, Clone)]
pub struct VehicleSwitchCostConstraint {
    switch_cost: Cost,
}

impl VehicleSwitchCostConstraint {
    pub fn new(switch_cost: Cost) -> Self {
        VehicleSwitchCostConstraint { switch_cost }
    }
}

impl SoftRouteConstraint for VehicleSwitchCostConstraint {
    fn constraint_name(&self) -> &'static str {
        "vehicle_switch"
    }

    fn costs(&self, context: &JobInsertionContext) -> Cost {
        if context.route.has_vehicle() && !context.route.is_empty() && context.is_vehicle_switch() {
            self.switch_cost
        } else {
            0.0
        }
    }
}
