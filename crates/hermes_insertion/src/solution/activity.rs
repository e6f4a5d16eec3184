use serde::Serialize;
use smallvec::{SmallVec, smallvec};

use crate::problem::{
    amount::Amount,
    job::{Job, JobIdx},
    location::LocationIdx,
    time_window::TimeWindow,
    travel_cost_matrix::Time,
    vehicle::Vehicle,
    vehicle_routing_problem::VehicleRoutingProblem,
};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityType {
    Start,
    End,
    Pickup(JobIdx),
    Delivery(JobIdx),
    Service(JobIdx),
    Break(JobIdx),
}

impl ActivityType {
    pub fn job_id(&self) -> Option<JobIdx> {
        match self {
            ActivityType::Start | ActivityType::End => None,
            ActivityType::Pickup(job_id)
            | ActivityType::Delivery(job_id)
            | ActivityType::Service(job_id)
            | ActivityType::Break(job_id) => Some(*job_id),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TourActivity {
    activity_type: ActivityType,
    location_id: LocationIdx,
    earliest_start: Time,
    latest_start: Time,
    operation_time: Time,
    load_change: Amount,
    arrival_time: Time,
    end_time: Time,
}

impl TourActivity {
    pub fn new(
        activity_type: ActivityType,
        location_id: LocationIdx,
        time_window: &TimeWindow,
        operation_time: Time,
        load_change: Amount,
    ) -> Self {
        TourActivity {
            activity_type,
            location_id,
            earliest_start: time_window.start(),
            latest_start: time_window.end(),
            operation_time,
            load_change,
            arrival_time: 0.0,
            end_time: 0.0,
        }
    }

    /// Synthetic start of `vehicle`, leaving at `departure_time`.
    pub fn start(vehicle: &Vehicle, departure_time: Time) -> Self {
        TourActivity {
            activity_type: ActivityType::Start,
            location_id: vehicle.start_location_id(),
            earliest_start: vehicle.earliest_departure(),
            latest_start: f64::MAX,
            operation_time: 0.0,
            load_change: Amount::EMPTY,
            arrival_time: departure_time,
            end_time: departure_time,
        }
    }

    /// Synthetic end of `vehicle`.
    pub fn end(vehicle: &Vehicle) -> Self {
        TourActivity {
            activity_type: ActivityType::End,
            location_id: vehicle.end_location_id(),
            earliest_start: 0.0,
            latest_start: vehicle.latest_arrival(),
            operation_time: 0.0,
            load_change: Amount::EMPTY,
            arrival_time: 0.0,
            end_time: 0.0,
        }
    }

    pub(crate) fn placeholder(activity_type: ActivityType) -> Self {
        TourActivity::new(
            activity_type,
            LocationIdx::default(),
            &TimeWindow::default(),
            0.0,
            Amount::EMPTY,
        )
    }

    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    pub fn job_id(&self) -> Option<JobIdx> {
        self.activity_type.job_id()
    }

    pub fn is_start(&self) -> bool {
        self.activity_type == ActivityType::Start
    }

    pub fn is_end(&self) -> bool {
        self.activity_type == ActivityType::End
    }

    pub fn is_break(&self) -> bool {
        matches!(self.activity_type, ActivityType::Break(_))
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn set_location_id(&mut self, location_id: LocationIdx) {
        self.location_id = location_id;
    }

    pub fn earliest_start(&self) -> Time {
        self.earliest_start
    }

    pub fn latest_start(&self) -> Time {
        self.latest_start
    }

    pub fn operation_time(&self) -> Time {
        self.operation_time
    }

    /// Signed change of the vehicle load when the activity is performed.
    pub fn load_change(&self) -> &Amount {
        &self.load_change
    }

    pub fn arrival_time(&self) -> Time {
        self.arrival_time
    }

    pub fn end_time(&self) -> Time {
        self.end_time
    }

    pub fn set_arrival_time(&mut self, arrival_time: Time) {
        self.arrival_time = arrival_time;
    }

    pub fn set_end_time(&mut self, end_time: Time) {
        self.end_time = end_time;
    }

    /// Departure time after arriving at `arrival_time`, waiting for the window to open if needed.
    #[inline]
    pub fn departure_after(&self, arrival_time: Time) -> Time {
        arrival_time.max(self.earliest_start) + self.operation_time
    }
}

/// Fresh activities for `job`, in visiting order. Each call returns new values so that
/// concurrent evaluations never share an activity.
pub fn create_activities(
    problem: &VehicleRoutingProblem,
    job_id: JobIdx,
) -> SmallVec<[TourActivity; 2]> {
    match problem.job(job_id) {
        Job::Service(service) => smallvec![TourActivity::new(
            ActivityType::Service(job_id),
            service.location_id(),
            service.time_window(),
            service.duration(),
            service.demand().clone(),
        )],
        Job::Pickup(service) => smallvec![TourActivity::new(
            ActivityType::Pickup(job_id),
            service.location_id(),
            service.time_window(),
            service.duration(),
            service.demand().clone(),
        )],
        Job::Delivery(service) => smallvec![TourActivity::new(
            ActivityType::Delivery(job_id),
            service.location_id(),
            service.time_window(),
            service.duration(),
            service.demand().negated(),
        )],
        Job::Shipment(shipment) => smallvec![
            TourActivity::new(
                ActivityType::Pickup(job_id),
                shipment.pickup().location_id(),
                shipment.pickup().time_window(),
                shipment.pickup().duration(),
                shipment.demand().clone(),
            ),
            TourActivity::new(
                ActivityType::Delivery(job_id),
                shipment.delivery().location_id(),
                shipment.delivery().time_window(),
                shipment.delivery().duration(),
                shipment.demand().negated(),
            ),
        ],
        Job::Break(vehicle_break) => smallvec![TourActivity::new(
            ActivityType::Break(job_id),
            problem
                .vehicle(vehicle_break.vehicle_id())
                .start_location_id(),
            vehicle_break.time_window(),
            vehicle_break.duration(),
            Amount::EMPTY,
        )],
    }
}
