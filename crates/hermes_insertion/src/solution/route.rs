use crate::{
    define_index_newtype,
    insertion::auxiliary_path_cost::AuxiliaryPathCost,
    problem::{
        job::JobIdx,
        location::LocationIdx,
        travel_cost_matrix::{Cost, Time},
        vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    state::route_states::RouteStates,
};

use super::{
    activity::{ActivityType, TourActivity},
    driver::Driver,
};

define_index_newtype!(RouteIdx, VehicleRoute);

/// Ordered activities served by one vehicle. A route without a vehicle is the empty route,
/// a valid target for a first insertion.
#[derive(Debug, Clone)]
pub struct VehicleRoute {
    vehicle_id: Option<VehicleIdx>,
    driver: Driver,
    departure_time: Time,
    start: TourActivity,
    end: TourActivity,
    activities: Vec<TourActivity>,
    states: RouteStates,
}

impl Default for VehicleRoute {
    fn default() -> Self {
        VehicleRoute::empty()
    }
}

impl VehicleRoute {
    pub fn empty() -> Self {
        VehicleRoute {
            vehicle_id: None,
            driver: Driver::NoDriver,
            departure_time: 0.0,
            start: TourActivity::placeholder(ActivityType::Start),
            end: TourActivity::placeholder(ActivityType::End),
            activities: Vec::new(),
            states: RouteStates::default(),
        }
    }

    pub fn new(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx, departure_time: Time) -> Self {
        let mut route = VehicleRoute::empty();
        route.set_vehicle(problem, vehicle_id, departure_time);
        route
    }

    pub fn vehicle_id(&self) -> Option<VehicleIdx> {
        self.vehicle_id
    }

    pub fn has_vehicle(&self) -> bool {
        self.vehicle_id.is_some()
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn set_driver(&mut self, driver: Driver) {
        self.driver = driver;
    }

    pub fn departure_time(&self) -> Time {
        self.departure_time
    }

    pub fn start(&self) -> &TourActivity {
        &self.start
    }

    pub fn end(&self) -> &TourActivity {
        &self.end
    }

    pub fn activities(&self) -> &[TourActivity] {
        &self.activities
    }

    pub fn activity(&self, index: usize) -> &TourActivity {
        &self.activities[index]
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn states(&self) -> &RouteStates {
        &self.states
    }

    pub(crate) fn set_states(&mut self, states: RouteStates) {
        self.states = states;
    }

    pub fn contains_job(&self, job_id: JobIdx) -> bool {
        self.activities
            .iter()
            .any(|activity| activity.job_id() == Some(job_id))
    }

    /// Jobs served by this route, each listed once, in order of first visit.
    pub fn job_ids(&self) -> Vec<JobIdx> {
        let mut job_ids: Vec<JobIdx> = Vec::with_capacity(self.activities.len());
        for job_id in self.activities.iter().filter_map(TourActivity::job_id) {
            if !job_ids.contains(&job_id) {
                job_ids.push(job_id);
            }
        }
        job_ids
    }

    /// Binds the route to `vehicle_id`, rebuilding the synthetic start and end.
    pub fn set_vehicle(&mut self, problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx, departure_time: Time) {
        let vehicle = problem.vehicle(vehicle_id);
        self.vehicle_id = Some(vehicle_id);
        self.departure_time = departure_time;
        self.start = TourActivity::start(vehicle, departure_time);
        self.end = TourActivity::end(vehicle);

        if !vehicle.return_to_depot() {
            let last_location = self
                .activities
                .last()
                .map_or(vehicle.start_location_id(), TourActivity::location_id);
            self.end.set_location_id(last_location);
        }
    }

    pub fn set_end_location(&mut self, location_id: LocationIdx) {
        self.end.set_location_id(location_id);
    }

    pub fn insert_activity(&mut self, index: usize, activity: TourActivity) {
        self.activities.insert(index, activity);
    }

    /// Removes the break activity of `break_job`, returning whether it was present.
    pub fn remove_break(&mut self, break_job: JobIdx) -> bool {
        let before = self.activities.len();
        self.activities
            .retain(|activity| activity.activity_type() != ActivityType::Break(break_job));
        before != self.activities.len()
    }

    /// Recomputes arrival and end times along the route for the bound vehicle.
    pub fn update_schedule(&mut self, problem: &VehicleRoutingProblem) {
        let Some(vehicle_id) = self.vehicle_id else {
            return;
        };
        let vehicle = problem.vehicle(vehicle_id);

        self.start.set_arrival_time(self.departure_time);
        self.start.set_end_time(self.departure_time);

        let mut previous_location = self.start.location_id();
        let mut previous_end = self.departure_time;
        for activity in self.activities.iter_mut() {
            let arrival = previous_end + problem.travel_time(previous_location, activity.location_id());
            activity.set_arrival_time(arrival);
            activity.set_end_time(activity.departure_after(arrival));
            previous_location = activity.location_id();
            previous_end = activity.end_time();
        }

        let arrival_at_end = if vehicle.return_to_depot() {
            previous_end + problem.travel_time(previous_location, self.end.location_id())
        } else {
            previous_end
        };
        self.end.set_arrival_time(arrival_at_end);
        self.end.set_end_time(arrival_at_end);
    }

    /// Transport and activity costs of the whole route, excluding fixed costs.
    pub fn total_cost(&self, problem: &VehicleRoutingProblem) -> Cost {
        let Some(vehicle_id) = self.vehicle_id else {
            return 0.0;
        };

        let path: Vec<&TourActivity> = std::iter::once(&self.start)
            .chain(self.activities.iter())
            .chain(std::iter::once(&self.end))
            .collect();
        AuxiliaryPathCost::new(problem).cost_of_path(&path, self.departure_time, vehicle_id)
    }
}
