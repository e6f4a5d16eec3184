use smallvec::SmallVec;

use crate::{
    problem::{
        travel_cost_matrix::{Cost, Time},
        vehicle::VehicleIdx,
    },
    solution::{activity::TourActivity, driver::Driver},
};

/// Stand-in for "unbounded" in cost formulas that need a finite value.
pub const MAX_COST: Cost = i32::MAX as f64;

/// Deferred route mutation describing a candidate insertion before it is chosen. Events
/// carry no route: they are applied to the route the insertion data was computed for.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    InsertActivity {
        vehicle_id: VehicleIdx,
        activity: TourActivity,
        index: usize,
    },
    InsertBreak {
        vehicle_id: VehicleIdx,
        activity: TourActivity,
        index: usize,
    },
    SwitchVehicle {
        vehicle_id: VehicleIdx,
        departure_time: Time,
    },
}

/// Cheapest feasible way found to insert a job into a route. Indices refer to the route's
/// activity list before the insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertionData {
    pub cost: Cost,
    pub additional_time: Time,
    pub pickup_index: Option<usize>,
    pub delivery_index: Option<usize>,
    pub vehicle_id: Option<VehicleIdx>,
    pub driver: Driver,
    pub departure_time: Time,
    pub events: SmallVec<[Event; 3]>,
}

pub const NO_INSERTION_FOUND: InsertionData = InsertionData {
    cost: f64::INFINITY,
    additional_time: 0.0,
    pickup_index: None,
    delivery_index: None,
    vehicle_id: None,
    driver: Driver::NoDriver,
    departure_time: 0.0,
    events: SmallVec::new_const(),
};

impl InsertionData {
    pub fn new(
        cost: Cost,
        pickup_index: Option<usize>,
        delivery_index: Option<usize>,
        vehicle_id: VehicleIdx,
        driver: Driver,
        departure_time: Time,
    ) -> Self {
        InsertionData {
            cost,
            additional_time: 0.0,
            pickup_index,
            delivery_index,
            vehicle_id: Some(vehicle_id),
            driver,
            departure_time,
            events: SmallVec::new(),
        }
    }

    #[inline]
    pub fn no_insertion_found() -> Self {
        NO_INSERTION_FOUND
    }

    #[inline]
    pub fn is_no_insertion_found(&self) -> bool {
        self.vehicle_id.is_none()
    }

    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_additional_time(mut self, additional_time: Time) -> Self {
        self.additional_time = additional_time;
        self
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Activity carried by the `InsertBreak` event, if any.
    pub fn break_activity(&self) -> Option<(&TourActivity, usize)> {
        self.events.iter().find_map(|event| match event {
            Event::InsertBreak { activity, index, .. } => Some((activity, *index)),
            _ => None,
        })
    }
}
