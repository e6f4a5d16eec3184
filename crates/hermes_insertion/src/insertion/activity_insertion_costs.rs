use crate::{
    problem::travel_cost_matrix::{Cost, Time},
    solution::activity::TourActivity,
};

use super::{
    auxiliary_path_cost::AuxiliaryPathCost,
    insertion_context::{ActivityInsertion, JobInsertionContext},
};

/// Marginal cost of splicing one activity into a gap, and the delay it pushes onto the
/// successor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivityInsertionCost {
    pub cost: Cost,
    pub additional_time: Time,
}

#[derive(Debug, Clone)]
pub enum ActivityInsertionCosts {
    Local(LocalActivityInsertionCosts),
    RouteLevel(RouteLevelActivityInsertionCosts),
}

impl ActivityInsertionCosts {
    pub fn cost(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> ActivityInsertionCost {
        match self {
            ActivityInsertionCosts::Local(local) => local.cost(context, insertion),
            ActivityInsertionCosts::RouteLevel(route_level) => route_level.cost(context, insertion),
        }
    }
}

/// Looks at the immediate neighbours of the gap only.
#[derive(Debug, Clone)]
pub struct LocalActivityInsertionCosts {
    activity_cost_weight: f64,
}

impl Default for LocalActivityInsertionCosts {
    fn default() -> Self {
        LocalActivityInsertionCosts::new(1.0)
    }
}

impl LocalActivityInsertionCosts {
    pub fn new(activity_cost_weight: f64) -> Self {
        LocalActivityInsertionCosts {
            activity_cost_weight,
        }
    }

    pub fn cost(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> ActivityInsertionCost {
        let problem = context.problem;
        let vehicle_id = context.new_vehicle;
        let vehicle = context.vehicle();
        let (prev, new, next) = (insertion.prev, insertion.new, insertion.next);
        let weight = context.progress.completeness_ratio() * self.activity_cost_weight;

        let transport_prev_new = problem.transport_cost(prev.location_id(), new.location_id(), vehicle_id);
        let arrival_at_new = insertion.arrival_at_new(problem);
        let end_at_new = new.departure_after(arrival_at_new);
        let activity_cost_new = problem.activity_cost(new, arrival_at_new, vehicle_id);

        if next.is_end() && !vehicle.return_to_depot() {
            return ActivityInsertionCost {
                cost: transport_prev_new + weight * activity_cost_new,
                additional_time: end_at_new - insertion.prev_end_time,
            };
        }

        let transport_new_next = problem.transport_cost(new.location_id(), next.location_id(), vehicle_id);
        let arrival_at_next = end_at_new + problem.travel_time(new.location_id(), next.location_id());
        let end_at_next = next.departure_after(arrival_at_next);
        let activity_cost_next = problem.activity_cost(next, arrival_at_next, vehicle_id);
        let total_costs =
            transport_prev_new + transport_new_next + weight * (activity_cost_new + activity_cost_next);

        let route = context.route;
        let transport_prev_next = problem.transport_cost(prev.location_id(), next.location_id(), vehicle_id);
        let (old_costs, old_end_at_next) = match route.vehicle_id() {
            Some(route_vehicle) if !route.is_empty() => {
                let old_arrival_at_next =
                    prev.end_time() + problem.travel_time(prev.location_id(), next.location_id());
                let old_end_at_next = next.departure_after(old_arrival_at_next);
                let old_activity_cost_next = problem.activity_cost(next, old_arrival_at_next, vehicle_id);

                let delay = (end_at_next - old_end_at_next).max(0.0);
                let waiting_savings = route
                    .states()
                    .future_waiting_at(insertion.next_position)
                    .min(delay)
                    * problem.vehicle_type_of(route_vehicle).cost_per_waiting();

                (
                    transport_prev_next + weight * (old_activity_cost_next + waiting_savings),
                    old_end_at_next,
                )
            }
            _ => {
                let old_arrival_at_next =
                    insertion.prev_end_time + problem.travel_time(prev.location_id(), next.location_id());
                (
                    transport_prev_next
                        + weight * problem.activity_cost(next, old_arrival_at_next, vehicle_id),
                    next.departure_after(old_arrival_at_next),
                )
            }
        };

        ActivityInsertionCost {
            cost: total_costs - old_costs,
            additional_time: (end_at_next - old_end_at_next).max(0.0),
        }
    }
}

/// Prices the path from the predecessor through `forward_looking` further activities with
/// the candidate vehicle, against the committed route costs over the same stretch.
#[derive(Debug, Clone)]
pub struct RouteLevelActivityInsertionCosts {
    forward_looking: usize,
}

impl RouteLevelActivityInsertionCosts {
    pub fn new(forward_looking: usize) -> Self {
        RouteLevelActivityInsertionCosts { forward_looking }
    }

    pub fn cost(&self, context: &JobInsertionContext, insertion: &ActivityInsertion) -> ActivityInsertionCost {
        let route = context.route;
        let end = TourActivity::end(context.vehicle());

        let mut path: Vec<&TourActivity> = Vec::with_capacity(self.forward_looking + 4);
        path.extend([insertion.prev, insertion.new, insertion.next]);
        let mut last_position = insertion.next_position;

        if self.forward_looking > 0 && !insertion.next.is_end() {
            // next sits at activity index `next_position - 1`
            let forward = route
                .activities()
                .iter()
                .skip(insertion.next_position)
                .take(self.forward_looking);
            let mut processed = 0;
            for activity in forward {
                path.push(activity);
                processed += 1;
            }
            last_position += processed;

            if processed < self.forward_looking {
                path.push(&end);
                last_position = route.len() + 1;
            }
        }

        let total_cost = AuxiliaryPathCost::new(context.problem).cost_of_path(
            &path,
            insertion.prev_end_time,
            context.new_vehicle,
        );

        let states = route.states();
        let old_cost = states.cost_at(last_position)
            - insertion
                .prev_position
                .map_or(0.0, |position| states.cost_at(position));

        ActivityInsertionCost {
            cost: total_cost - old_cost,
            additional_time: 0.0,
        }
    }
}
