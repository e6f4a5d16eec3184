use crate::{
    problem::{
        amount::{Amount, EMPTY_AMOUNT},
        job::JobKind,
        travel_cost_matrix::{Cost, Time},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solution::{activity::ActivityType, route::VehicleRoute},
};

/// Aggregates cached per route, indexed by position: `0` is the start, `i + 1` the
/// activity at index `i` and `len + 1` the end. Missing values read as zero, empty loads
/// or an unbounded latest start.
#[derive(Debug, Clone, Default)]
pub struct RouteStates {
    costs: Vec<Cost>,
    loads: Vec<Amount>,
    past_max_loads: Vec<Amount>,
    future_max_loads: Vec<Amount>,
    future_waiting: Vec<Time>,
    latest_starts: Vec<Vec<Time>>,
    load_at_beginning: Amount,
    load_at_end: Amount,
    max_load: Amount,
    total_cost: Cost,
}

#[inline]
pub const fn position_of(activity_index: usize) -> usize {
    activity_index + 1
}

impl RouteStates {
    pub fn compute(problem: &VehicleRoutingProblem, route: &VehicleRoute) -> RouteStates {
        let Some(vehicle_id) = route.vehicle_id() else {
            return RouteStates::default();
        };
        let vehicle = problem.vehicle(vehicle_id);
        let activities = route.activities();
        let len = activities.len();
        let positions = len + 2;

        let mut costs = vec![0.0; positions];
        let mut previous = route.start();
        let mut cumulative = 0.0;
        for (index, activity) in activities.iter().enumerate() {
            cumulative += problem.transport_cost(previous.location_id(), activity.location_id(), vehicle_id)
                + problem.activity_cost(activity, activity.arrival_time(), vehicle_id);
            costs[position_of(index)] = cumulative;
            previous = activity;
        }
        if vehicle.return_to_depot() {
            cumulative += problem.transport_cost(previous.location_id(), route.end().location_id(), vehicle_id);
        }
        costs[len + 1] = cumulative;

        let mut load_at_beginning = Amount::EMPTY;
        for activity in activities {
            if let ActivityType::Delivery(job_id) = activity.activity_type() {
                if problem.job(job_id).kind() == JobKind::Delivery {
                    load_at_beginning -= activity.load_change();
                }
            }
        }

        let mut loads = Vec::with_capacity(positions);
        loads.push(load_at_beginning.clone());
        for activity in activities {
            let mut load = loads[loads.len() - 1].clone();
            load += activity.load_change();
            loads.push(load);
        }
        let load_at_end = loads[len].clone();
        loads.push(load_at_end.clone());

        let mut past_max_loads = Vec::with_capacity(positions);
        let mut running = Amount::EMPTY;
        for load in &loads {
            running.update_max(load);
            past_max_loads.push(running.clone());
        }

        let mut future_max_loads = vec![Amount::EMPTY; positions];
        let mut running = Amount::EMPTY;
        for position in (0..positions).rev() {
            running.update_max(&loads[position]);
            future_max_loads[position] = running.clone();
        }

        let mut future_waiting = vec![0.0; positions];
        for index in (0..len).rev() {
            let activity = &activities[index];
            let waiting = (activity.earliest_start() - activity.arrival_time()).max(0.0);
            future_waiting[position_of(index)] = waiting + future_waiting[position_of(index) + 1];
        }

        let latest_starts = problem
            .end_groups()
            .iter()
            .map(|group| {
                let mut latest = vec![f64::MAX; positions];
                latest[len + 1] = if group.return_to_depot {
                    group.latest_arrival
                } else {
                    f64::MAX
                };

                for index in (0..len).rev() {
                    let activity = &activities[index];
                    let position = position_of(index);
                    latest[position] = if index + 1 == len && !group.return_to_depot {
                        activity.latest_start()
                    } else {
                        let next_location = if index + 1 == len {
                            group.location_id
                        } else {
                            activities[index + 1].location_id()
                        };
                        let potential = latest[position + 1]
                            - problem.travel_time(activity.location_id(), next_location)
                            - activity.operation_time();
                        activity.latest_start().min(potential)
                    };
                }
                latest
            })
            .collect();

        let max_load = past_max_loads[len + 1].clone();

        RouteStates {
            costs,
            loads,
            past_max_loads,
            future_max_loads,
            future_waiting,
            latest_starts,
            load_at_beginning,
            load_at_end,
            max_load,
            total_cost: cumulative,
        }
    }

    /// Transport and activity costs accumulated up to and including the activity at `position`.
    #[inline]
    pub fn cost_at(&self, position: usize) -> Cost {
        self.costs.get(position).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn total_cost(&self) -> Cost {
        self.total_cost
    }

    /// Load right after the activity at `position`.
    #[inline]
    pub fn load_at(&self, position: usize) -> &Amount {
        self.loads.get(position).unwrap_or(&EMPTY_AMOUNT)
    }

    #[inline]
    pub fn past_max_load_at(&self, position: usize) -> &Amount {
        self.past_max_loads.get(position).unwrap_or(&EMPTY_AMOUNT)
    }

    #[inline]
    pub fn future_max_load_at(&self, position: usize) -> &Amount {
        self.future_max_loads.get(position).unwrap_or(&EMPTY_AMOUNT)
    }

    /// Waiting time at the activity at `position` and every activity after it.
    #[inline]
    pub fn future_waiting_at(&self, position: usize) -> Time {
        self.future_waiting.get(position).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn latest_start_at(&self, end_group: usize, position: usize) -> Time {
        self.latest_starts
            .get(end_group)
            .and_then(|latest| latest.get(position))
            .copied()
            .unwrap_or(f64::MAX)
    }

    pub fn load_at_beginning(&self) -> &Amount {
        &self.load_at_beginning
    }

    pub fn load_at_end(&self) -> &Amount {
        &self.load_at_end
    }

    pub fn max_load(&self) -> &Amount {
        &self.max_load
    }
}
