use serde::Serialize;

use super::{time_window::TimeWindow, travel_cost_matrix::Time, vehicle::VehicleIdx};

/// A rest bound to exactly one vehicle. It has no location of its own: once inserted it
/// takes the location of one of its neighbours.
#[derive(Serialize, Debug, Clone)]
pub struct VehicleBreak {
    external_id: String,
    time_window: TimeWindow,
    duration: Time,
    vehicle_id: VehicleIdx,
}

impl VehicleBreak {
    pub fn new(external_id: String, time_window: TimeWindow, duration: Time) -> Self {
        VehicleBreak {
            external_id,
            time_window,
            duration,
            vehicle_id: VehicleIdx::default(),
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn duration(&self) -> Time {
        self.duration
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    pub(crate) fn set_vehicle_id(&mut self, vehicle_id: VehicleIdx) {
        self.vehicle_id = vehicle_id;
    }
}
