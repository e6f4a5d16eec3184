use crate::problem::travel_cost_matrix::Cost;

use super::insertion_context::JobInsertionContext;

/// Extra cost of reaching the route's first activity from the candidate vehicle's start and of
/// returning from its last activity to the candidate vehicle's end, compared to the vehicle
/// currently serving the route.
pub fn access_egress_delta(context: &JobInsertionContext) -> Cost {
    let route = context.route;
    let Some(current_vehicle_id) = route.vehicle_id() else {
        return 0.0;
    };
    if route.is_empty() || current_vehicle_id == context.new_vehicle {
        return 0.0;
    }

    let problem = context.problem;
    let new_vehicle = context.vehicle();
    let current_vehicle = problem.vehicle(current_vehicle_id);
    if new_vehicle.start_location_id() == current_vehicle.start_location_id()
        && new_vehicle.end_location_id() == current_vehicle.end_location_id()
        && new_vehicle.return_to_depot() == current_vehicle.return_to_depot()
        && new_vehicle.vehicle_type() == current_vehicle.vehicle_type()
        && context.new_departure_time == route.departure_time()
    {
        return 0.0;
    }

    let activities = route.activities();
    let (Some(first), Some(last)) = (activities.first(), activities.last()) else {
        return 0.0;
    };

    let access_new = problem.transport_cost(
        new_vehicle.start_location_id(),
        first.location_id(),
        context.new_vehicle,
    );
    let access_old = problem.transport_cost(
        route.start().location_id(),
        first.location_id(),
        current_vehicle_id,
    );

    let egress = if new_vehicle.return_to_depot() {
        let egress_new = problem.transport_cost(
            last.location_id(),
            new_vehicle.end_location_id(),
            context.new_vehicle,
        );
        let egress_old =
            problem.transport_cost(last.location_id(), route.end().location_id(), current_vehicle_id);
        egress_new - egress_old
    } else {
        0.0
    };

    access_new - access_old + egress
}
