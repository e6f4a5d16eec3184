use std::sync::Arc;

use tracing::trace;

use crate::{
    error::InsertionError,
    insertion::insertion_data::{Event, InsertionData},
    problem::{job::JobIdx, vehicle::VehicleIdx, vehicle_routing_problem::VehicleRoutingProblem},
    solution::route::VehicleRoute,
};

use super::listeners::InsertionListeners;

/// Applies a chosen insertion to its route and notifies the listeners.
pub struct Inserter {
    problem: Arc<VehicleRoutingProblem>,
    listeners: InsertionListeners,
}

impl Inserter {
    pub fn new(problem: Arc<VehicleRoutingProblem>, listeners: InsertionListeners) -> Self {
        Inserter { problem, listeners }
    }

    pub fn listeners(&self) -> &InsertionListeners {
        &self.listeners
    }

    /// Inserts `job_id` into `route` as described by `data`.
    ///
    /// Returns the break job of the outgoing vehicle when a vehicle switch removed it from the
    /// route; the caller owns it again.
    pub fn insert_job(
        &self,
        job_id: JobIdx,
        data: &InsertionData,
        route: &mut VehicleRoute,
    ) -> Result<Option<JobIdx>, InsertionError> {
        let Some(new_vehicle) = data.vehicle_id else {
            return Err(InsertionError::InvalidInsertion(job_id));
        };
        if data.events.is_empty() {
            return Err(InsertionError::UnsupportedJob {
                job: job_id,
                reason: "insertion carries no events",
            });
        }
        if let Some(vehicle_break) = self.problem.job(job_id).as_break()
            && vehicle_break.vehicle_id() != new_vehicle
        {
            return Err(InsertionError::UnsupportedJob {
                job: job_id,
                reason: "break of another vehicle",
            });
        }

        trace!(job = %job_id, vehicle = %new_vehicle, cost = data.cost, "insert");
        self.listeners.before_job_insertion(job_id, data, route);

        if route.vehicle_id() != Some(new_vehicle) {
            self.listeners
                .vehicle_switched(route, route.vehicle_id(), Some(new_vehicle));
        }

        let mut displaced_break = None;
        for event in &data.events {
            if let Some(removed) = self.apply(event, route) {
                displaced_break = Some(removed);
            }
        }
        route.set_driver(data.driver);

        self.listeners.job_inserted(job_id, route, data);
        Ok(displaced_break)
    }

    fn apply(&self, event: &Event, route: &mut VehicleRoute) -> Option<JobIdx> {
        match event {
            Event::InsertActivity {
                vehicle_id,
                activity,
                index,
            }
            | Event::InsertBreak {
                vehicle_id,
                activity,
                index,
            } => {
                route.insert_activity(*index, activity.clone());
                self.relocate_open_end(route, *vehicle_id, *index);
                None
            }
            Event::SwitchVehicle {
                vehicle_id,
                departure_time,
            } => self.switch_vehicle(route, *vehicle_id, *departure_time),
        }
    }

    /// Routes of vehicles that do not return end at their last activity.
    fn relocate_open_end(&self, route: &mut VehicleRoute, vehicle_id: VehicleIdx, index: usize) {
        if self.problem.vehicle(vehicle_id).return_to_depot() || index + 1 != route.len() {
            return;
        }
        let location_id = route.activity(index).location_id();
        route.set_end_location(location_id);
    }

    fn switch_vehicle(
        &self,
        route: &mut VehicleRoute,
        vehicle_id: VehicleIdx,
        departure_time: f64,
    ) -> Option<JobIdx> {
        let mut displaced_break = None;
        if let Some(old_vehicle) = route.vehicle_id()
            && old_vehicle != vehicle_id
        {
            trace!(from = %old_vehicle, to = %vehicle_id, "switch vehicle");
            if let Some(break_job) = self.problem.vehicle(old_vehicle).break_job()
                && route.remove_break(break_job)
            {
                displaced_break = Some(break_job);
            }
        }

        route.set_vehicle(&self.problem, vehicle_id, departure_time);
        displaced_break
    }
}
